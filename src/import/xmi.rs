//! Enterprise Architect XMI / SOSI UML feature catalogue import
//!
//! Parses UML 1.3 XMI exports as produced by Enterprise Architect for the
//! Norwegian SOSI model registry. Classes stereotyped `FeatureType` become
//! feature types; `CodeList` classes become value domains; `dataType`
//! classes are inlined as nested attribute groups.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::http::HttpGet;
use crate::models::{
    Association, Attribute, FeatureType, Geometry, ListedValue, Relationships, ValueDomain,
    format_cardinality,
};

use super::ImportError;
use super::xml_tree::{XmlElement, parse_xml_tree};

/// SOSI attribute-name tokens that mark a geometry-valued attribute.
const GEOMETRY_NAME_TOKENS: [&str; 10] = [
    "PUNKT",
    "LINJE",
    "KURVE",
    "FLATE",
    "OMRÅDE",
    "OMRADE",
    "GRENSE",
    "REPRESENTASJONSPUNKT",
    "REPRESENTASJONSLINJE",
    "REPRESENTASJONSFLATE",
];

/// Basic-auth credentials for fetching remote XMI files.
///
/// The SOSI model registry is publicly readable with the well-known
/// `sosi`/`sosi` account, which is the default.
#[derive(Debug, Clone)]
pub struct XmiAuth {
    pub username: String,
    pub password: String,
}

impl Default for XmiAuth {
    fn default() -> Self {
        Self {
            username: "sosi".to_string(),
            password: "sosi".to_string(),
        }
    }
}

/// Load feature types from a local XMI file or an HTTP(S) URL.
///
/// # Arguments
///
/// * `source` - Local path (tried first) or fully qualified URL.
/// * `auth` - Credentials applied to HTTP fetches only.
/// * `getter` - HTTP collaborator used when `source` is a URL.
///
/// # Errors
///
/// `ImportError::FileNotFound` when `source` is neither an existing file nor
/// an HTTP(S) URL, `ImportError::Network` on fetch failures and
/// `ImportError::Xml` when the document cannot be parsed.
pub fn load_feature_types_from_xmi(
    source: &str,
    auth: &XmiAuth,
    getter: &dyn HttpGet,
) -> Result<Vec<FeatureType>, ImportError> {
    let text = load_xmi_text(source, auth, getter)?;
    parse_feature_types(&text)
}

fn load_xmi_text(source: &str, auth: &XmiAuth, getter: &dyn HttpGet) -> Result<String, ImportError> {
    let path = Path::new(source);
    if path.exists() {
        let data = std::fs::read(path).map_err(|err| ImportError::Io(err.to_string()))?;
        return Ok(decode_text(&data));
    }

    let lowered = source.to_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        return Err(ImportError::FileNotFound(source.to_string()));
    }

    let credentials = (!auth.username.is_empty() || !auth.password.is_empty())
        .then(|| (auth.username.as_str(), auth.password.as_str()));
    let response = getter
        .get_with_auth(source, credentials)
        .map_err(|_| ImportError::Network {
            url: source.to_string(),
            status: None,
        })?;
    if response.is_error() {
        return Err(ImportError::Network {
            url: source.to_string(),
            status: response.status,
        });
    }

    Ok(decode_text(&response.body))
}

/// Decode XMI bytes. Legacy Enterprise Architect exports are often
/// cp1252/latin-1 encoded; those bytes map directly onto code points.
fn decode_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => data.iter().map(|&byte| byte as char).collect(),
    }
}

#[derive(Debug, Clone)]
struct UmlAttribute {
    name: String,
    type_name: Option<String>,
    description: String,
    lower: Option<String>,
    upper: Option<String>,
    tags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct UmlClass {
    id: String,
    name: String,
    stereotype: Option<String>,
    tagged_values: HashMap<String, String>,
    is_abstract: bool,
    attributes: Vec<UmlAttribute>,
}

#[derive(Debug, Clone, Default)]
struct CodeListEntry {
    listed_values: Vec<ListedValue>,
    definition: Option<String>,
    as_dictionary: Option<String>,
    code_list: Option<String>,
}

impl CodeListEntry {
    fn is_empty(&self) -> bool {
        self.listed_values.is_empty()
            && self.definition.is_none()
            && self.as_dictionary.is_none()
            && self.code_list.is_none()
    }
}

/// Parse feature types out of an XMI document already loaded into memory.
pub fn parse_feature_types(text: &str) -> Result<Vec<FeatureType>, ImportError> {
    let root = parse_xml_tree(text)?;

    let (classes, order) = collect_classes(&root);
    let parents = collect_generalizations(&root);
    let associations = collect_associations(&root, &classes);

    let classes_by_name: HashMap<&str, &UmlClass> = classes
        .values()
        .map(|class| (class.name.as_str(), class))
        .collect();
    let codelists = build_code_lists(&classes);

    let mut feature_types = Vec::new();
    for class_id in &order {
        let info = &classes[class_id];
        if info.stereotype.as_deref() != Some("FeatureType") {
            continue;
        }
        feature_types.push(build_feature_type(
            info,
            &classes,
            &classes_by_name,
            &parents,
            &codelists,
            &associations,
        ));
    }

    Ok(feature_types)
}

// --- XMI collection passes ------------------------------------------------

fn collect_classes(root: &XmlElement) -> (HashMap<String, UmlClass>, Vec<String>) {
    let mut classes = HashMap::new();
    let mut order = Vec::new();

    for class_elem in root.descendants("Class") {
        let Some(class_id) = identifier(class_elem) else {
            continue;
        };
        let info = UmlClass {
            id: class_id.to_string(),
            name: class_elem.attr("name").unwrap_or("").trim().to_string(),
            stereotype: extract_stereotype(class_elem),
            tagged_values: extract_tagged_values(class_elem),
            is_abstract: class_elem
                .attr("isAbstract")
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true")),
            attributes: collect_attributes(class_elem),
        };
        classes.insert(class_id.to_string(), info);
        order.push(class_id.to_string());
    }

    (classes, order)
}

fn collect_attributes(class_elem: &XmlElement) -> Vec<UmlAttribute> {
    let Some(container) = class_elem.child("Classifier.feature") else {
        return Vec::new();
    };

    container
        .children_named("Attribute")
        .map(|attr_elem| {
            let tags = extract_tagged_values(attr_elem);
            let type_name = tags
                .get("type")
                .filter(|value| !value.is_empty())
                .cloned()
                .or_else(|| extract_type_name(attr_elem));
            let (lower, upper) = extract_bounds(attr_elem, &tags);
            let description = clean_text(tags.get("description").map(String::as_str).unwrap_or(""));
            UmlAttribute {
                name: attr_elem.attr("name").unwrap_or("").trim().to_string(),
                type_name,
                description,
                lower,
                upper,
                tags,
            }
        })
        .collect()
}

fn collect_generalizations(root: &XmlElement) -> HashMap<String, Vec<String>> {
    let mut parents: HashMap<String, Vec<String>> = HashMap::new();
    for generalization in root.descendants("Generalization") {
        let subtype = generalization.attr("subtype").unwrap_or("");
        let supertype = generalization.attr("supertype").unwrap_or("");
        if subtype.is_empty() || supertype.is_empty() {
            continue;
        }
        parents
            .entry(subtype.to_string())
            .or_default()
            .push(supertype.to_string());
    }
    parents
}

/// Association entries keyed by the class they are navigable from.
///
/// When any end declares `isNavigable="true"` only the explicitly navigable
/// directions are kept; otherwise the association counts both ways.
fn collect_associations(
    root: &XmlElement,
    classes: &HashMap<String, UmlClass>,
) -> HashMap<String, Vec<Association>> {
    let mut associations: HashMap<String, Vec<Association>> = HashMap::new();

    for association in root.descendants("Association") {
        let Some(connection) = association.child("Association.connection") else {
            continue;
        };
        let ends: Vec<&XmlElement> = connection.children_named("AssociationEnd").collect();
        if ends.len() < 2 {
            continue;
        }

        let mut end_infos: Vec<(&XmlElement, &str, Option<bool>)> = Vec::new();
        let mut explicit_true = false;
        for end in ends {
            let Some(source_id) = end.attr("type").filter(|id| !id.is_empty()) else {
                continue;
            };
            let navigable = association_end_is_navigable(end);
            if navigable == Some(true) {
                explicit_true = true;
            }
            end_infos.push((end, source_id, navigable));
        }

        for (index, (_, source_id, _)) in end_infos.iter().enumerate() {
            for (other_index, (other, target_id, other_navigable)) in end_infos.iter().enumerate() {
                if index == other_index {
                    continue;
                }
                if explicit_true && *other_navigable != Some(true) {
                    continue;
                }
                let Some(target_info) = classes.get(*target_id) else {
                    continue;
                };

                let role = other.attr("name").unwrap_or("");
                let (lower, upper) = extract_association_bounds(other);
                let cardinality = if lower.is_some() || upper.is_some() {
                    Some(format_cardinality(
                        lower.as_deref().unwrap_or(""),
                        upper.as_deref().unwrap_or(""),
                    ))
                } else {
                    None
                };

                associations
                    .entry((*source_id).to_string())
                    .or_default()
                    .push(Association {
                        target: target_info.name.clone(),
                        role: (!role.is_empty()).then(|| role.to_string()),
                        cardinality,
                    });
            }
        }
    }

    associations
}

fn build_code_lists(classes: &HashMap<String, UmlClass>) -> HashMap<String, CodeListEntry> {
    let mut listings = HashMap::new();

    for class_info in classes.values() {
        if class_info.stereotype.as_deref() != Some("CodeList") {
            continue;
        }

        let mut entry = CodeListEntry::default();
        for attribute in &class_info.attributes {
            let value = attribute
                .tags
                .get("code")
                .filter(|code| !code.is_empty())
                .cloned()
                .unwrap_or_else(|| attribute.name.clone());
            let label = {
                let cleaned =
                    clean_text(attribute.tags.get("description").map(String::as_str).unwrap_or(""));
                if cleaned.is_empty() { value.clone() } else { cleaned }
            };
            entry.listed_values.push(ListedValue::new(value, label));
        }

        let definition = clean_text(
            class_info
                .tagged_values
                .get("documentation")
                .map(String::as_str)
                .unwrap_or(""),
        );
        if !definition.is_empty() {
            entry.definition = Some(definition);
        }
        entry.as_dictionary = class_info
            .tagged_values
            .get("asDictionary")
            .filter(|value| !value.is_empty())
            .cloned();
        entry.code_list = class_info
            .tagged_values
            .get("codeList")
            .filter(|value| !value.is_empty())
            .cloned();

        if !entry.is_empty() {
            listings.insert(class_info.name.clone(), entry);
        }
    }

    listings
}

// --- feature type assembly ------------------------------------------------

fn build_feature_type(
    class_info: &UmlClass,
    classes_by_id: &HashMap<String, UmlClass>,
    classes_by_name: &HashMap<&str, &UmlClass>,
    parents: &HashMap<String, Vec<String>>,
    codelists: &HashMap<String, CodeListEntry>,
    associations: &HashMap<String, Vec<Association>>,
) -> FeatureType {
    let direct = collect_direct_attributes(&class_info.id, classes_by_id);

    let mut geometry: Option<Geometry> = None;
    let mut attributes: Vec<Attribute> = Vec::new();

    for attribute in &direct {
        if geometry.is_none() && is_geometry_attribute(attribute) {
            geometry = Some(build_geometry_attribute(attribute));
            continue;
        }
        if let Some(converted) = convert_attribute(
            attribute,
            classes_by_id,
            classes_by_name,
            codelists,
            &HashSet::new(),
        ) {
            attributes.push(converted);
        }
    }

    let description = clean_text(
        class_info
            .tagged_values
            .get("documentation")
            .map(String::as_str)
            .unwrap_or(""),
    );

    let inheritance: Vec<String> = parents
        .get(&class_info.id)
        .into_iter()
        .flatten()
        .filter_map(|parent_id| classes_by_id.get(parent_id))
        .map(|parent| parent.name.clone())
        .collect();
    let association_entries = associations
        .get(&class_info.id)
        .cloned()
        .unwrap_or_default();

    FeatureType {
        name: class_info.name.clone(),
        description,
        is_abstract: class_info.is_abstract,
        geometry,
        attributes,
        relationships: Some(Relationships {
            inheritance,
            associations: association_entries,
        }),
    }
}

/// Direct attributes of a class, deduplicated by display name. A repeated
/// name replaces the earlier declaration in place.
fn collect_direct_attributes(
    class_id: &str,
    classes_by_id: &HashMap<String, UmlClass>,
) -> Vec<UmlAttribute> {
    let Some(info) = classes_by_id.get(class_id) else {
        return Vec::new();
    };

    let mut direct: Vec<UmlAttribute> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for attribute in &info.attributes {
        let key = attribute.name.trim().to_string();
        if key.is_empty() {
            continue;
        }
        if let Some(&position) = positions.get(&key) {
            direct[position] = attribute.clone();
        } else {
            positions.insert(key, direct.len());
            direct.push(attribute.clone());
        }
    }
    direct
}

fn convert_attribute(
    attribute: &UmlAttribute,
    classes_by_id: &HashMap<String, UmlClass>,
    classes_by_name: &HashMap<&str, &UmlClass>,
    codelists: &HashMap<String, CodeListEntry>,
    visited_types: &HashSet<String>,
) -> Option<Attribute> {
    let name = attribute.name.trim();
    if name.is_empty() {
        return None;
    }

    let attr_type = attribute
        .tags
        .get("type")
        .filter(|value| !value.is_empty())
        .cloned()
        .or_else(|| attribute.type_name.clone())
        .unwrap_or_else(|| "CharacterString".to_string());

    let mut entry = Attribute::new(name, attr_type.as_str());

    if !attribute.description.is_empty() {
        entry.description = Some(attribute.description.clone());
    }

    let lower = attribute
        .lower
        .as_deref()
        .filter(|value| !value.is_empty())
        .or_else(|| attribute.tags.get("lowerBound").map(String::as_str))
        .unwrap_or("");
    let upper = attribute
        .upper
        .as_deref()
        .filter(|value| !value.is_empty())
        .or_else(|| attribute.tags.get("upperBound").map(String::as_str))
        .unwrap_or("");
    entry.cardinality = format_cardinality(lower, upper);

    let mut value_domain = build_value_domain(&attr_type, codelists);
    if let Some(external) = attribute
        .tags
        .get("defaultCodeSpace")
        .filter(|value| !value.is_empty())
    {
        value_domain
            .get_or_insert_with(|| ValueDomain::enumeration(Vec::new()))
            .code_list = Some(external.clone());
    }
    if let Some(dictionary) = attribute
        .tags
        .get("asDictionary")
        .filter(|value| !value.is_empty())
    {
        value_domain
            .get_or_insert_with(|| ValueDomain::enumeration(Vec::new()))
            .as_dictionary = Some(dictionary.clone());
    }
    entry.value_domain = value_domain;

    // Inline dataType-stereotyped structures, guarding against cycles along
    // the current path.
    if let Some(data_type) = classes_by_name.get(attr_type.as_str())
        && data_type.stereotype.as_deref() == Some("dataType")
        && !visited_types.contains(&data_type.id)
    {
        let mut nested_types = visited_types.clone();
        nested_types.insert(data_type.id.clone());
        let nested_attributes = collect_direct_attributes(&data_type.id, classes_by_id);
        entry.attributes = nested_attributes
            .iter()
            .filter_map(|nested| {
                convert_attribute(nested, classes_by_id, classes_by_name, codelists, &nested_types)
            })
            .collect();
    }

    Some(entry)
}

fn build_value_domain(
    attr_type: &str,
    codelists: &HashMap<String, CodeListEntry>,
) -> Option<ValueDomain> {
    let codelist = codelists.get(attr_type)?;

    let mut domain = ValueDomain::enumeration(codelist.listed_values.clone());
    domain.definition = codelist.definition.clone();
    domain.as_dictionary = codelist.as_dictionary.clone();
    domain.code_list = codelist.code_list.clone();
    Some(domain)
}

fn build_geometry_attribute(attribute: &UmlAttribute) -> Geometry {
    let geometry_type = attribute
        .tags
        .get("type")
        .filter(|value| !value.is_empty())
        .cloned()
        .or_else(|| attribute.type_name.clone())
        .unwrap_or_else(|| "geometry".to_string());
    let name = if attribute.name.is_empty() {
        "geometry".to_string()
    } else {
        attribute.name.clone()
    };

    Geometry {
        name: Some(name),
        geometry_type,
        ogc_role: Some(serde_json::Value::String("primary-geometry".to_string())),
        description: (!attribute.description.is_empty()).then(|| attribute.description.clone()),
        ..Geometry::default()
    }
}

fn is_geometry_attribute(attribute: &UmlAttribute) -> bool {
    let type_name = attribute
        .tags
        .get("type")
        .filter(|value| !value.is_empty())
        .cloned()
        .or_else(|| attribute.type_name.clone())
        .unwrap_or_default()
        .to_uppercase();
    if type_name.starts_with("GM_")
        || matches!(type_name.as_str(), "GMPOINT" | "GMCURVE" | "GMSURFACE" | "GMOBJECT")
    {
        return true;
    }

    let name = attribute.name.to_uppercase();
    GEOMETRY_NAME_TOKENS.iter().any(|token| name.contains(token))
}

// --- low-level XMI helpers ------------------------------------------------

fn identifier(element: &XmlElement) -> Option<&str> {
    element.attr("xmi.id").or_else(|| element.attr("xmi:id"))
}

fn extract_stereotype(element: &XmlElement) -> Option<String> {
    let stereotype = element.find_path(&["ModelElement.stereotype", "Stereotype"])?;
    stereotype
        .attr("name")
        .filter(|name| !name.is_empty())
        .or_else(|| stereotype.attr("xmi.idref").filter(|reference| !reference.is_empty()))
        .map(String::from)
}

fn extract_tagged_values(element: &XmlElement) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let Some(container) = element.child("ModelElement.taggedValue") else {
        return values;
    };
    for tagged in container.children_named("TaggedValue") {
        if let Some(tag) = tagged.attr("tag").filter(|tag| !tag.is_empty()) {
            values.insert(tag.to_string(), tagged.attr("value").unwrap_or("").to_string());
        }
    }
    values
}

fn extract_type_name(attribute: &XmlElement) -> Option<String> {
    let type_elem = attribute.find_path(&["StructuralFeature.type", "Classifier"])?;
    type_elem
        .children
        .iter()
        .find_map(|child| child.attr("name").filter(|name| !name.is_empty()))
        .map(String::from)
}

fn extract_bounds(
    attribute: &XmlElement,
    tags: &HashMap<String, String>,
) -> (Option<String>, Option<String>) {
    if let Some(range) = attribute.find_path(&[
        "StructuralFeature.multiplicity",
        "Multiplicity",
        "Multiplicity.range",
        "MultiplicityRange",
    ]) {
        return (
            range.attr("lower").map(String::from),
            range.attr("upper").map(String::from),
        );
    }
    (
        tags.get("lowerBound").cloned(),
        tags.get("upperBound").cloned(),
    )
}

fn extract_association_bounds(end: &XmlElement) -> (Option<String>, Option<String>) {
    if let Some(multiplicity) = end.attr("multiplicity").filter(|value| !value.is_empty()) {
        return split_range(multiplicity);
    }

    if let Some(range) = end.find_path(&[
        "AssociationEnd.multiplicity",
        "Multiplicity",
        "Multiplicity.range",
        "MultiplicityRange",
    ]) {
        return (
            range.attr("lower").map(String::from),
            range.attr("upper").map(String::from),
        );
    }
    (None, None)
}

fn split_range(value: &str) -> (Option<String>, Option<String>) {
    if let Some((lower, upper)) = value.split_once("..") {
        (
            (!lower.is_empty()).then(|| lower.to_string()),
            (!upper.is_empty()).then(|| upper.to_string()),
        )
    } else {
        (Some(value.to_string()), Some(value.to_string()))
    }
}

fn association_end_is_navigable(end: &XmlElement) -> Option<bool> {
    let raw = end
        .attr("isNavigable")
        .filter(|value| !value.is_empty())
        .or_else(|| end.attr("navigable").filter(|value| !value.is_empty()));
    if let Some(parsed) = raw.and_then(parse_bool) {
        return Some(parsed);
    }

    let nav_elem = end.child("AssociationEnd.isNavigable")?;
    let raw = nav_elem
        .attr("xmi.value")
        .filter(|value| !value.is_empty())
        .or_else(|| nav_elem.attr("value").filter(|value| !value.is_empty()));
    if let Some(parsed) = raw.and_then(parse_bool) {
        return Some(parsed);
    }

    let expressions = nav_elem.descendants("BooleanExpression");
    let expression = expressions.first()?;
    let raw = expression
        .attr("body")
        .map(String::from)
        .unwrap_or_else(|| expression.text.clone());
    parse_bool(&raw)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Normalize tag text: Enterprise Architect double-escapes entities and
/// mixes line-ending conventions.
fn clean_text(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let unescaped = quick_xml::escape::unescape(value)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| value.to_string());
    let normalized = unescaped.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};
    use serde_json::json;
    use std::io::Write;

    struct NoHttp;

    impl HttpGet for NoHttp {
        fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            Err(HttpError::Request(format!("unexpected request to {url}")))
        }
    }

    const CATALOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<XMI xmi.version="1.1" xmlns:UML="omg.org/UML1.3">
  <XMI.content>
    <UML:Model name="Testmodell">
      <UML:Class xmi.id="c1" name="Bygning" isAbstract="false">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="FeatureType"/>
        </UML:ModelElement.stereotype>
        <UML:ModelElement.taggedValue>
          <UML:TaggedValue tag="documentation" value="Bygning med &amp;#230;rverdig historie.&#10;  Andre linje.  "/>
        </UML:ModelElement.taggedValue>
        <UML:Classifier.feature>
          <UML:Attribute name="bygningsnummer">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="Integer"/>
              <UML:TaggedValue tag="description" value="Unikt nummer"/>
            </UML:ModelElement.taggedValue>
            <UML:StructuralFeature.multiplicity>
              <UML:Multiplicity>
                <UML:Multiplicity.range>
                  <UML:MultiplicityRange lower="1" upper="1"/>
                </UML:Multiplicity.range>
              </UML:Multiplicity>
            </UML:StructuralFeature.multiplicity>
          </UML:Attribute>
          <UML:Attribute name="status">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="Bygningsstatus"/>
              <UML:TaggedValue tag="lowerBound" value="0"/>
              <UML:TaggedValue tag="upperBound" value="*"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
          <UML:Attribute name="adresse">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="Adresse"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
          <UML:Attribute name="grense">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="GM_Curve"/>
              <UML:TaggedValue tag="description" value="Avgrensning"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
        </UML:Classifier.feature>
      </UML:Class>
      <UML:Class xmi.id="c2" name="Eiendom">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="FeatureType"/>
        </UML:ModelElement.stereotype>
      </UML:Class>
      <UML:Class xmi.id="c3" name="Bygningsstatus">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="CodeList"/>
        </UML:ModelElement.stereotype>
        <UML:ModelElement.taggedValue>
          <UML:TaggedValue tag="documentation" value="Status for bygningen"/>
          <UML:TaggedValue tag="asDictionary" value="true"/>
        </UML:ModelElement.taggedValue>
        <UML:Classifier.feature>
          <UML:Attribute name="planlagt">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="code" value="P"/>
              <UML:TaggedValue tag="description" value="Planlagt bygning"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
          <UML:Attribute name="eksisterende"/>
        </UML:Classifier.feature>
      </UML:Class>
      <UML:Class xmi.id="c4" name="Adresse">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="dataType"/>
        </UML:ModelElement.stereotype>
        <UML:Classifier.feature>
          <UML:Attribute name="gatenavn">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="CharacterString"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
          <UML:Attribute name="underadresse">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="Adresse"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
        </UML:Classifier.feature>
      </UML:Class>
      <UML:Class xmi.id="c5" name="AbstraktBygning" isAbstract="true">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="FeatureType"/>
        </UML:ModelElement.stereotype>
      </UML:Class>
      <UML:Generalization xmi.id="g1" subtype="c1" supertype="c5"/>
      <UML:Association xmi.id="a1">
        <UML:Association.connection>
          <UML:AssociationEnd type="c1" multiplicity="0..*"/>
          <UML:AssociationEnd type="c2" name="eiendom" isNavigable="true" multiplicity="1"/>
        </UML:Association.connection>
      </UML:Association>
    </UML:Model>
  </XMI.content>
</XMI>"#;

    #[test]
    fn test_parses_feature_types_with_geometry_and_codelist() {
        let feature_types = parse_feature_types(CATALOGUE).unwrap();
        let names: Vec<&str> = feature_types.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Bygning", "Eiendom", "AbstraktBygning"]);

        let bygning = &feature_types[0];
        assert_eq!(bygning.description, "Bygning med ærverdig historie.\nAndre linje.");
        assert!(!bygning.is_abstract);

        let geometry = bygning.geometry.as_ref().unwrap();
        assert_eq!(geometry.name.as_deref(), Some("grense"));
        assert_eq!(geometry.geometry_type, "GM_Curve");
        assert_eq!(geometry.ogc_role, Some(json!("primary-geometry")));
        assert_eq!(geometry.description.as_deref(), Some("Avgrensning"));

        let names: Vec<&str> = bygning.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["bygningsnummer", "status", "adresse"]);

        let nummer = &bygning.attributes[0];
        assert_eq!(nummer.attribute_type, "Integer");
        assert_eq!(nummer.cardinality, "1");
        assert_eq!(nummer.description.as_deref(), Some("Unikt nummer"));

        let status = &bygning.attributes[1];
        assert_eq!(status.cardinality, "0..*");
        let domain = status.value_domain.as_ref().unwrap();
        assert_eq!(domain.domain_type, "enumeration");
        assert_eq!(domain.definition.as_deref(), Some("Status for bygningen"));
        assert_eq!(domain.as_dictionary.as_deref(), Some("true"));
        assert_eq!(domain.listed_values.len(), 2);
        assert_eq!(domain.listed_values[0].value, json!("P"));
        assert_eq!(domain.listed_values[0].label, "Planlagt bygning");
        assert_eq!(domain.listed_values[1].value, json!("eksisterende"));
        assert_eq!(domain.listed_values[1].label, "eksisterende");
    }

    #[test]
    fn test_data_type_inlined_with_cycle_guard() {
        let feature_types = parse_feature_types(CATALOGUE).unwrap();
        let adresse = &feature_types[0].attributes[2];
        assert_eq!(adresse.attribute_type, "Adresse");
        assert_eq!(adresse.attributes.len(), 2);
        assert_eq!(adresse.attributes[0].name, "gatenavn");

        // The self-referencing member keeps its type but is not expanded.
        let underadresse = &adresse.attributes[1];
        assert_eq!(underadresse.attribute_type, "Adresse");
        assert!(underadresse.attributes.is_empty());
    }

    #[test]
    fn test_explicit_navigability_restricts_direction() {
        let feature_types = parse_feature_types(CATALOGUE).unwrap();

        let bygning = feature_types[0].relationships.as_ref().unwrap();
        assert_eq!(bygning.inheritance, vec!["AbstraktBygning".to_string()]);
        assert_eq!(bygning.associations.len(), 1);
        assert_eq!(bygning.associations[0].target, "Eiendom");
        assert_eq!(bygning.associations[0].role.as_deref(), Some("eiendom"));
        assert_eq!(bygning.associations[0].cardinality.as_deref(), Some("1"));

        let eiendom = feature_types[1].relationships.as_ref().unwrap();
        assert!(eiendom.associations.is_empty());
    }

    #[test]
    fn test_missing_local_file_is_an_error() {
        let error =
            load_feature_types_from_xmi("/no/such/file.xml", &XmiAuth::default(), &NoHttp)
                .unwrap_err();
        assert!(matches!(error, ImportError::FileNotFound(_)));
    }

    #[test]
    fn test_loads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOGUE.as_bytes()).unwrap();

        let feature_types = load_feature_types_from_xmi(
            file.path().to_str().unwrap(),
            &XmiAuth::default(),
            &NoHttp,
        )
        .unwrap();
        assert_eq!(feature_types.len(), 3);
    }
}
