//! GML application schema (XSD) fallback parsing
//!
//! Some OGC API deployments only advertise a GML application schema instead
//! of a JSON Schema. This module converts such an XSD into the same
//! `{"title": ..., "properties": {...}}` shape the JSON path produces, so the
//! downstream attribute extraction does not care where the schema came from.

use serde_json::{Map, Value, json};

use super::xml_tree::{XmlElement, parse_xml_tree};

/// Parse an XSD document into a schema mapping, or `None` when the text is
/// not usable (invalid XML, no complex type, no properties).
pub fn parse_gml_schema(xml_text: &str) -> Option<Value> {
    let root = parse_xml_tree(xml_text).ok()?;

    let complex_types: Vec<(&str, &XmlElement)> = root
        .descendants("complexType")
        .into_iter()
        .filter_map(|element| element.attr("name").filter(|n| !n.is_empty()).map(|n| (n, element)))
        .collect();

    let mut feature_type_name: Option<&str> = None;
    let mut feature_element_name: Option<&str> = None;
    for element in root.descendants("element") {
        let substitution_group = element.attr("substitutionGroup").unwrap_or("");
        if substitution_group.contains("AbstractFeature") {
            feature_type_name = element.attr("type").map(strip_prefix).filter(|n| !n.is_empty());
            feature_element_name = element.attr("name");
            if feature_type_name.is_some() {
                break;
            }
        }
    }

    if feature_type_name.is_none() && complex_types.len() == 1 {
        feature_type_name = Some(complex_types[0].0);
    }

    let selected = feature_type_name
        .and_then(|name| {
            complex_types
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, element)| *element)
        })
        .or_else(|| complex_types.first().map(|(_, element)| *element))?;

    let properties = parse_complex_type_properties(selected);
    if properties.is_empty() {
        return None;
    }

    let mut schema = Map::new();
    schema.insert("properties".to_string(), Value::Object(properties));
    let title = feature_type_name
        .or(feature_element_name)
        .or_else(|| selected.attr("name"));
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        schema.insert("title".to_string(), json!(title));
    }

    Some(Value::Object(schema))
}

fn strip_prefix(value: &str) -> &str {
    match value.split_once(':') {
        Some((_, local)) => local,
        None => value,
    }
}

/// Collect property elements from the most specific location that has any:
/// a direct sequence, an extension's sequence, anywhere under an extension,
/// anywhere under a sequence, and finally anywhere in the complex type.
fn parse_complex_type_properties(complex_type: &XmlElement) -> Map<String, Value> {
    let mut elements: Vec<&XmlElement> = Vec::new();

    if let Some(sequence) = complex_type.child("sequence") {
        elements = sequence.children_named("element").collect();
    }
    if elements.is_empty()
        && let Some(sequence) = complex_type.find_path(&["complexContent", "extension", "sequence"])
    {
        elements = sequence.children_named("element").collect();
    }
    if elements.is_empty()
        && let Some(extension) = complex_type.find_path(&["complexContent", "extension"])
    {
        elements = extension.descendants("element");
    }
    if elements.is_empty()
        && let Some(sequence) = complex_type.child("sequence")
    {
        elements = sequence.descendants("element");
    }
    if elements.is_empty() {
        elements = complex_type.descendants("element");
    }

    let mut properties = Map::new();
    for element in elements {
        if let Some((name, details)) = parse_xsd_element(element)
            && !properties.contains_key(&name)
        {
            properties.insert(name, details);
        }
    }

    properties
}

fn parse_xsd_element(element: &XmlElement) -> Option<(String, Value)> {
    let name = element
        .attr("name")
        .filter(|n| !n.is_empty())
        .or_else(|| element.attr("ref").map(strip_prefix).filter(|n| !n.is_empty()))?
        .to_string();

    let mut details = Map::new();
    if let Some(type_value) = element.attr("type").filter(|t| !t.is_empty()) {
        details.insert("type".to_string(), json!(type_value));
    } else if let Some(reference) = element.attr("ref").filter(|r| !r.is_empty()) {
        details.insert("type".to_string(), json!(reference));
    }

    if let Some(group) = element.attr("substitutionGroup").filter(|g| !g.is_empty()) {
        details.insert("substitutionGroup".to_string(), json!(group));
    }

    for key in ["minOccurs", "maxOccurs"] {
        let Some(value) = element.attr(key) else {
            continue;
        };
        if value == "unbounded" {
            details.insert(key.to_string(), json!(value));
        } else if let Ok(number) = value.parse::<i64>() {
            details.insert(key.to_string(), json!(number));
        }
    }

    if let Some(nillable) = element.attr("nillable").filter(|n| !n.is_empty()) {
        details.insert("nillable".to_string(), json!(nillable));
    }

    if let Some(documentation) = element.find_path(&["annotation", "documentation"]) {
        let text = documentation.text.trim();
        if !text.is_empty() {
            details.insert("description".to_string(), json!(text));
        }
    }

    let details = Value::Object(details);
    if looks_like_geometry_type(&details) {
        let mut map = match details {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        map.entry("format".to_string()).or_insert_with(|| json!("gml"));
        return Some((name, Value::Object(map)));
    }

    Some((name, details))
}

/// Whether a property description reads as a geometry-valued member.
pub(crate) fn looks_like_geometry_type(details: &Value) -> bool {
    let type_value = details
        .get("type")
        .or_else(|| details.get("dataType"))
        .or_else(|| details.get("ref"))
        .and_then(Value::as_str);
    if let Some(type_value) = type_value {
        let lowered = type_value.to_lowercase();
        if lowered.contains("gml") || lowered.contains("geometry") {
            return true;
        }
    }

    if let Some(format) = details.get("format").and_then(Value::as_str) {
        let lowered = format.to_lowercase();
        if lowered.contains("gml") || lowered.contains("geometry") {
            return true;
        }
    }

    let substitution_group = details
        .get("substitutionGroup")
        .or_else(|| details.get("substitution_group"))
        .and_then(Value::as_str);
    if let Some(group) = substitution_group
        && group.to_lowercase().contains("geometry")
    {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<schema xmlns="http://www.w3.org/2001/XMLSchema"
        xmlns:gml="http://www.opengis.net/gml/3.2"
        xmlns:app="https://example.com/app">
  <element name="Road" type="app:RoadType" substitutionGroup="gml:AbstractFeature"/>
  <complexType name="RoadType">
    <complexContent>
      <extension base="gml:AbstractFeatureType">
        <sequence>
          <element name="identifier" type="string" minOccurs="1" maxOccurs="1">
            <annotation>
              <documentation>Unique road identifier</documentation>
            </annotation>
          </element>
          <element name="lanes" type="integer" minOccurs="0"/>
          <element name="centerline" type="gml:CurvePropertyType"/>
        </sequence>
      </extension>
    </complexContent>
  </complexType>
</schema>"#;

    #[test]
    fn test_feature_type_via_substitution_group() {
        let schema = parse_gml_schema(SCHEMA).unwrap();
        assert_eq!(schema["title"], "RoadType");
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["identifier", "lanes", "centerline"]
        );
        assert_eq!(
            properties["identifier"]["description"],
            "Unique road identifier"
        );
        assert_eq!(properties["identifier"]["minOccurs"], 1);
        assert_eq!(properties["lanes"]["minOccurs"], 0);
    }

    #[test]
    fn test_geometry_element_gets_gml_format() {
        let schema = parse_gml_schema(SCHEMA).unwrap();
        assert_eq!(schema["properties"]["centerline"]["format"], "gml");
        assert!(schema["properties"]["lanes"].get("format").is_none());
    }

    #[test]
    fn test_single_complex_type_fallback() {
        let text = r#"<schema xmlns="http://www.w3.org/2001/XMLSchema">
          <complexType name="Plot">
            <sequence>
              <element name="area" type="double" maxOccurs="unbounded"/>
            </sequence>
          </complexType>
        </schema>"#;
        let schema = parse_gml_schema(text).unwrap();
        assert_eq!(schema["title"], "Plot");
        assert_eq!(schema["properties"]["area"]["maxOccurs"], "unbounded");
    }

    #[test]
    fn test_unusable_documents() {
        assert!(parse_gml_schema("not xml at all").is_none());
        assert!(
            parse_gml_schema(r#"<schema xmlns="http://www.w3.org/2001/XMLSchema"/>"#).is_none()
        );
    }
}
