//! PlantUML class-diagram rendering of feature types
//!
//! One class per feature type (`<<featureType>>` stereotype, `abstract`
//! keyword for abstract types), attribute lines with ISO 19103-style type
//! names, geometry attributes in their own compartment, nested object
//! attributes as composed classes, codelist domains as enum blocks, and
//! inheritance/association edges at the end of the diagram.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Attribute, FeatureType, Geometry, ValueDomain};

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static NON_IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Rendering knobs for [`render_feature_types_to_puml`].
#[derive(Debug, Clone)]
pub struct PumlOptions {
    pub title: Option<String>,
    /// Wrap all classes in a named package block
    pub package: Option<String>,
    pub include_notes: bool,
    pub include_descriptions: bool,
}

impl Default for PumlOptions {
    fn default() -> Self {
        Self {
            title: None,
            package: None,
            include_notes: true,
            include_descriptions: true,
        }
    }
}

/// Convert feature types into a PlantUML class diagram.
pub fn render_feature_types_to_puml(feature_types: &[FeatureType], options: &PumlOptions) -> String {
    let mut lines: Vec<String> = vec!["@startuml".to_string()];
    if let Some(title) = options.title.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(format!("title {title}"));
        lines.push(String::new());
    }

    lines.extend(
        [
            "skinparam backgroundColor #F7F8FA",
            "skinparam shadowing false",
            "skinparam RoundCorner 8",
            "skinparam ArrowColor #94A3B8",
            "skinparam class {",
            "  BackgroundColor #FFFFFF",
            "  BorderColor #CBD5E1",
            "  FontColor #0F172A",
            "  HeaderBackgroundColor #EEF2F7",
            "  HeaderFontColor #0F172A",
            "  AttributeIconSize 0",
            "}",
            "skinparam stereotypeCBackgroundColor #E2E8F0",
            "skinparam stereotypeCBorderColor #CBD5E1",
            "skinparam stereotypeCFontColor #0F172A",
            "",
        ]
        .map(String::from),
    );

    let mut indent = "";
    let mut alias_map: IndexMap<String, String> = IndexMap::new();
    let datatypes = collect_datatypes(feature_types);
    let enumerations = collect_enumerations(feature_types);

    if let Some(package) = options.package.as_deref().filter(|p| !p.trim().is_empty()) {
        lines.push(format!("package \"{package}\" {{"));
        lines.push(String::new());
        indent = "  ";
    }

    for (index, feature_type) in feature_types.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        let alias = append_feature_type(&mut lines, feature_type, indent, options);
        alias_map.insert(feature_type.name.clone(), alias);
    }

    for (name, attributes) in &datatypes {
        lines.push(String::new());
        let alias = append_data_type(&mut lines, name, attributes, indent, options);
        alias_map.insert(name.clone(), alias);
    }

    for (name, value_domain) in &enumerations {
        lines.push(String::new());
        let alias = append_enumeration(&mut lines, name, value_domain, indent);
        alias_map.insert(name.clone(), alias);
    }

    if options.package.is_some() {
        lines.push("}".to_string());
    }

    let relation_lines = build_relationship_lines(feature_types, &alias_map, indent);
    if !relation_lines.is_empty() {
        lines.push(String::new());
        lines.extend(relation_lines);
    }

    lines.push(String::new());
    lines.push("@enduml".to_string());

    lines.join("\n")
}

fn append_feature_type(
    lines: &mut Vec<String>,
    feature_type: &FeatureType,
    indent: &str,
    options: &PumlOptions,
) -> String {
    let (header, alias) = class_header_and_alias(&feature_type.name);
    let keyword = if feature_type.is_abstract { "abstract " } else { "" };
    lines.push(format!("{indent}{keyword}class {header} <<featureType>> {{"));

    let mut entries: Vec<Attribute> = feature_type.attributes.clone();
    if let Some(geometry) = &feature_type.geometry {
        entries.insert(0, build_geometry_attribute(geometry));
    }

    let nested = append_attributes(lines, &entries, indent, options.include_descriptions, "");

    lines.push(format!("{indent}}}"));

    if options.include_notes {
        let note_lines = build_note_lines(feature_type);
        if !note_lines.is_empty() {
            lines.push(format!("{indent}note right of {alias}"));
            for note_line in &note_lines {
                lines.push(format!("{indent}  {note_line}"));
            }
            lines.push(format!("{indent}end note"));
        }
    }

    if nested.is_empty() {
        return alias;
    }

    let mut class_blocks: Vec<Vec<String>> = Vec::new();
    let mut relations: Vec<String> = Vec::new();
    for (attribute, prefix) in &nested {
        let (blocks, edges) = build_nested_object_classes(
            attribute,
            &alias,
            indent,
            options.include_descriptions,
            prefix,
        );
        class_blocks.extend(blocks);
        relations.extend(edges);
    }

    if !relations.is_empty() || !class_blocks.is_empty() {
        lines.push(String::new());
    }
    lines.extend(relations.iter().cloned());
    if !class_blocks.is_empty() {
        if !relations.is_empty() {
            lines.push(String::new());
        }
        for (index, block) in class_blocks.iter().enumerate() {
            lines.extend(block.iter().cloned());
            if index != class_blocks.len() - 1 {
                lines.push(String::new());
            }
        }
    }

    alias
}

fn append_data_type(
    lines: &mut Vec<String>,
    name: &str,
    attributes: &[Attribute],
    indent: &str,
    options: &PumlOptions,
) -> String {
    let (header, alias) = class_header_and_alias(name);
    lines.push(format!("{indent}class {header} {{"));
    append_attributes(lines, attributes, indent, options.include_descriptions, "");
    lines.push(format!("{indent}}}"));
    alias
}

fn append_enumeration(
    lines: &mut Vec<String>,
    name: &str,
    value_domain: &ValueDomain,
    indent: &str,
) -> String {
    let (header, alias) = class_header_and_alias(name);
    lines.push(format!("{indent}enum {header} <<codeList>> {{"));
    for entry in &value_domain.listed_values {
        let value = scalar_text(&entry.value);
        let label = entry.label.trim();
        if value.is_empty() && label.is_empty() {
            continue;
        }
        if !value.is_empty() && !label.is_empty() && label != value {
            lines.push(format!("{indent}  {value} : {label}"));
        } else if !value.is_empty() {
            lines.push(format!("{indent}  {value}"));
        } else {
            lines.push(format!("{indent}  {label}"));
        }
    }
    lines.push(format!("{indent}}}"));
    alias
}

/// Append attribute lines, geometry-typed ones in their own compartment.
/// Returns attributes that expand into composed classes.
fn append_attributes<'a>(
    lines: &mut Vec<String>,
    attributes: &'a [Attribute],
    indent: &str,
    include_descriptions: bool,
    prefix: &str,
) -> Vec<(&'a Attribute, String)> {
    let mut regular: Vec<String> = Vec::new();
    let mut geometry: Vec<String> = Vec::new();
    let mut nested: Vec<(&Attribute, String)> = Vec::new();

    for attribute in attributes {
        let rendered = render_attribute_line(attribute, indent, include_descriptions, prefix);
        if attribute
            .attribute_type
            .to_lowercase()
            .starts_with("geometry-")
        {
            geometry.push(rendered);
        } else {
            regular.push(rendered);
        }

        if is_object_with_attributes(attribute) {
            nested.push((
                attribute,
                combine_attribute_prefix(prefix, attribute.name.trim()),
            ));
        }
    }

    if regular.is_empty() && geometry.is_empty() {
        lines.push(format!("{indent}  ' Ingen attributter"));
        return Vec::new();
    }

    lines.extend(regular.iter().cloned());
    if !geometry.is_empty() {
        if !regular.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{indent}  ..Geometri.."));
        lines.extend(geometry.iter().cloned());
    }

    nested
}

fn render_attribute_line(
    attribute: &Attribute,
    indent: &str,
    include_descriptions: bool,
    prefix: &str,
) -> String {
    let name = combine_attribute_prefix(prefix, attribute.name.trim());
    let uml_type = map_type(&attribute.attribute_type);
    let cardinality = attribute.cardinality.trim();

    let mut suffix = String::new();
    if include_descriptions
        && let Some(description) = &attribute.description
    {
        let cleaned = clean_inline_text(description);
        if !cleaned.is_empty() {
            suffix = format!("  ' {cleaned}");
        }
    }

    let cardinality_segment = if cardinality.is_empty() {
        String::new()
    } else {
        format!(" [{cardinality}]")
    };
    format!("{indent}  + {name}{cardinality_segment} : {uml_type}{suffix}")
}

fn combine_attribute_prefix(prefix: &str, name: &str) -> String {
    if !prefix.is_empty() && !name.is_empty() {
        format!("{prefix}.{name}")
    } else if !prefix.is_empty() {
        prefix.to_string()
    } else {
        name.to_string()
    }
}

/// Children make an attribute a composed class only when its type is plain
/// `object`; a named type with children is a standalone datatype instead.
fn is_object_with_attributes(attribute: &Attribute) -> bool {
    if attribute.attributes.is_empty() {
        return false;
    }
    let type_tag = attribute.attribute_type.trim().to_lowercase();
    type_tag.is_empty() || type_tag == "object"
}

fn derive_nested_class_name(parent_alias: &str, attribute_name: &str) -> String {
    let mut sanitized = NON_IDENTIFIER_RE
        .replace_all(attribute_name, "_")
        .into_owned();
    if sanitized.is_empty() {
        sanitized = "Attribute".to_string();
    }
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized = format!("_{sanitized}");
    }
    format!("{parent_alias}_{sanitized}")
}

fn build_nested_object_classes(
    attribute: &Attribute,
    parent_alias: &str,
    indent: &str,
    include_descriptions: bool,
    prefix: &str,
) -> (Vec<Vec<String>>, Vec<String>) {
    let attribute_name = if attribute.name.trim().is_empty() {
        "attribute"
    } else {
        attribute.name.trim()
    };
    let class_name = derive_nested_class_name(parent_alias, attribute_name);
    let (header, child_alias) = class_header_and_alias(&class_name);

    let mut class_lines: Vec<String> = vec![format!("{indent}class {header} {{")];
    let child_nested = append_attributes(
        &mut class_lines,
        &attribute.attributes,
        indent,
        include_descriptions,
        prefix,
    );
    class_lines.push(format!("{indent}}}"));

    let mut class_blocks: Vec<Vec<String>> = vec![class_lines];

    let mut relation_label = attribute_name.to_string();
    let cardinality = attribute.cardinality.trim();
    if !cardinality.is_empty() {
        relation_label = format!("{relation_label} [{cardinality}]");
    }
    let mut relations = vec![format!(
        "{indent}{parent_alias} *-- {child_alias} : {relation_label}"
    )];

    for (nested_attribute, nested_prefix) in &child_nested {
        let (blocks, edges) = build_nested_object_classes(
            nested_attribute,
            &child_alias,
            indent,
            include_descriptions,
            nested_prefix,
        );
        class_blocks.extend(blocks);
        relations.extend(edges);
    }

    (class_blocks, relations)
}

fn class_header_and_alias(name: &str) -> (String, String) {
    if IDENTIFIER_RE.is_match(name) {
        (name.to_string(), name.to_string())
    } else {
        let mut alias = NON_IDENTIFIER_RE.replace_all(name, "_").into_owned();
        if alias.is_empty() {
            alias = "FeatureType".to_string();
        }
        (format!("\"{name}\" as {alias}"), alias)
    }
}

fn build_geometry_attribute(geometry: &Geometry) -> Attribute {
    let name = geometry
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("geometry");
    let geometry_type = {
        let trimmed = geometry.geometry_type.trim();
        if trimmed.is_empty() { "geometry" } else { trimmed }
    };

    let mut attribute = Attribute::new(name, geometry_type);
    attribute.cardinality = "1".to_string();
    attribute.description = geometry.description.clone();
    attribute
}

/// First definition of each named datatype found in the attribute trees.
fn collect_datatypes(feature_types: &[FeatureType]) -> IndexMap<String, Vec<Attribute>> {
    let mut datatypes: IndexMap<String, Vec<Attribute>> = IndexMap::new();

    fn visit(attributes: &[Attribute], datatypes: &mut IndexMap<String, Vec<Attribute>>) {
        for attribute in attributes {
            if attribute.attributes.is_empty() {
                continue;
            }
            let type_tag = attribute.attribute_type.trim();
            if !type_tag.is_empty() && !is_object_with_attributes(attribute) {
                let entry = datatypes.entry(type_tag.to_string()).or_default();
                if entry.is_empty() {
                    *entry = attribute.attributes.clone();
                }
            }
            visit(&attribute.attributes, datatypes);
        }
    }

    for feature_type in feature_types {
        visit(&feature_type.attributes, &mut datatypes);
    }

    datatypes
}

/// Codelist value domains keyed by the declaring attribute's named type.
fn collect_enumerations(feature_types: &[FeatureType]) -> IndexMap<String, ValueDomain> {
    let mut enumerations: IndexMap<String, ValueDomain> = IndexMap::new();

    fn visit(attributes: &[Attribute], enumerations: &mut IndexMap<String, ValueDomain>) {
        for attribute in attributes {
            if let Some(value_domain) = &attribute.value_domain
                && !value_domain.listed_values.is_empty()
            {
                let type_tag = attribute.attribute_type.trim();
                if !type_tag.is_empty() && !is_primitive_type(type_tag) {
                    enumerations
                        .entry(type_tag.to_string())
                        .or_insert_with(|| value_domain.clone());
                }
            }
            visit(&attribute.attributes, enumerations);
        }
    }

    for feature_type in feature_types {
        visit(&feature_type.attributes, &mut enumerations);
    }

    enumerations
}

fn is_primitive_type(type_tag: &str) -> bool {
    let key = type_tag.trim().to_lowercase();
    matches!(
        key.as_str(),
        "string" | "str" | "integer" | "number" | "boolean" | "bool" | "array" | "list"
            | "object" | "unknown"
    ) || key.starts_with("date")
        || key.starts_with("geometry")
}

fn build_relationship_lines(
    feature_types: &[FeatureType],
    alias_map: &IndexMap<String, String>,
    indent: &str,
) -> Vec<String> {
    let alias_for = |name: &str| -> Option<String> {
        if let Some(alias) = alias_map.get(name) {
            return Some(alias.clone());
        }
        if name.is_empty() {
            return None;
        }
        Some(class_header_and_alias(name).1)
    };

    let mut lines: Vec<String> = Vec::new();
    for feature_type in feature_types {
        let Some(relationships) = &feature_type.relationships else {
            continue;
        };
        let Some(child_alias) = alias_for(&feature_type.name) else {
            continue;
        };

        for parent in &relationships.inheritance {
            if let Some(parent_alias) = alias_for(parent.trim()) {
                lines.push(format!("{indent}{parent_alias} <|-- {child_alias}"));
            }
        }

        for association in &relationships.associations {
            let Some(target_alias) = alias_for(association.target.trim()) else {
                continue;
            };
            let mut label_parts: Vec<String> = Vec::new();
            if let Some(role) = association.role.as_deref().map(str::trim)
                && !role.is_empty()
            {
                label_parts.push(role.to_string());
            }
            if let Some(cardinality) = association.cardinality.as_deref().map(str::trim)
                && !cardinality.is_empty()
            {
                label_parts.push(format!("[{cardinality}]"));
            }
            if label_parts.is_empty() {
                lines.push(format!("{indent}{child_alias} --> {target_alias}"));
            } else {
                lines.push(format!(
                    "{indent}{child_alias} --> {target_alias} : {}",
                    label_parts.join(" ")
                ));
            }
        }
    }

    lines
}

/// Map canonical type tags onto ISO 19103-style UML type names.
fn map_type(raw_type: &str) -> String {
    let trimmed = raw_type.trim();
    let key = trimmed.to_lowercase();

    if key.starts_with("date-time") {
        return "DateTime".to_string();
    }
    if key.starts_with("date") {
        return "Date".to_string();
    }
    if let Some(geometry_key) = key.strip_prefix("geometry-") {
        return match geometry_key {
            "point" => "GM_Point",
            "linestring" | "curve" | "line" => "GM_Curve",
            "polygon" | "surface" => "GM_Surface",
            "multipoint" => "GM_MultiPoint",
            "multilinestring" | "multicurve" => "GM_MultiCurve",
            "multipolygon" | "multisurface" => "GM_MultiSurface",
            "geometrycollection" => "GM_Object",
            _ => "GM_Object",
        }
        .to_string();
    }
    if key.starts_with("gm_") {
        return trimmed.to_string();
    }

    match key.as_str() {
        "string" => "CharacterString".to_string(),
        "integer" => "Integer".to_string(),
        "number" => "Real".to_string(),
        "boolean" => "Boolean".to_string(),
        "array" => "Sequence".to_string(),
        "object" => "Object".to_string(),
        "unknown" => "Any".to_string(),
        _ if trimmed.is_empty() => "Any".to_string(),
        _ => trimmed.to_string(),
    }
}

fn build_note_lines(feature_type: &FeatureType) -> Vec<String> {
    let mut lines = clean_multiline_text(&feature_type.description);

    if let Some(geometry) = &feature_type.geometry {
        let geometry_lines = build_geometry_note_lines(geometry);
        if !geometry_lines.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(geometry_lines);
        }
    }

    lines
}

fn build_geometry_note_lines(geometry: &Geometry) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    let geometry_type = geometry.geometry_type.trim();
    if !geometry_type.is_empty() && geometry_type.to_lowercase() != "feature" {
        lines.push(format!("Type: {geometry_type}"));
    }

    if let Some(storage_crs) = geometry.storage_crs.as_deref().map(str::trim)
        && !storage_crs.is_empty()
    {
        lines.push(format!("Storage CRS: {storage_crs}"));
    }

    let crs_values: Vec<&str> = geometry
        .crs
        .iter()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();
    if !crs_values.is_empty() {
        lines.push(format!("CRS: {}", crs_values.join(", ")));
    }

    lines
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn clean_inline_text(text: &str) -> String {
    clean_multiline_text(text).join(" ").replace('\'', "\u{2019}")
}

fn clean_multiline_text(text: &str) -> Vec<String> {
    let unescaped = match quick_xml::escape::unescape(text) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => text.to_string(),
    };
    let normalized = unescaped
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n");
    let stripped = HTML_TAG_RE.replace_all(&normalized, "");
    stripped
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Association, ListedValue, Relationships};

    fn fixture() -> Vec<FeatureType> {
        let mut status = Attribute::new("status", "Bygningsstatus");
        status.cardinality = "0..1".to_string();
        status.value_domain = Some(ValueDomain::enumeration(vec![
            ListedValue::new("1", "Planlagt"),
            ListedValue::new("2", "Revet"),
        ]));

        let mut address = Attribute::new("adresse", "object");
        address.cardinality = "0..*".to_string();
        address.attributes.push(Attribute::new("gatenavn", "string"));

        let mut geometry_attr = Attribute::new("grense", "geometry-polygon");
        geometry_attr.cardinality = "1".to_string();

        let mut building = FeatureType::new("Bygning");
        building.description = "Et byggverk.<br/>Fra matrikkelen.".to_string();
        building.geometry = Some(Geometry {
            geometry_type: "Polygon".to_string(),
            storage_crs: Some("EPSG:25833".to_string()),
            crs: Some(vec!["EPSG:4258".to_string()]),
            ..Geometry::default()
        });
        building.attributes = vec![status, address, geometry_attr];
        building.relationships = Some(Relationships {
            inheritance: vec!["Byggverk".to_string()],
            associations: vec![Association {
                target: "Eiendom".to_string(),
                role: Some("tilhører".to_string()),
                cardinality: Some("0..*".to_string()),
            }],
        });

        let mut base = FeatureType::new("Byggverk");
        base.is_abstract = true;

        let property = FeatureType::new("Eiendom");

        vec![building, base, property]
    }

    #[test]
    fn test_diagram_structure() {
        let output = render_feature_types_to_puml(&fixture(), &PumlOptions::default());

        assert!(output.starts_with("@startuml"));
        assert!(output.ends_with("@enduml"));
        assert!(output.contains("class Bygning <<featureType>> {"));
        assert!(output.contains("abstract class Byggverk <<featureType>> {"));
        assert!(output.contains("  + status [0..1] : Bygningsstatus"));
        assert!(output.contains("  ..Geometri.."));
        assert!(output.contains("  + grense [1] : GM_Surface"));
        // Synthesized geometry attribute from the geometry object.
        assert!(output.contains("  + geometry [1] : Polygon"));
    }

    #[test]
    fn test_nested_object_becomes_composed_class() {
        let output = render_feature_types_to_puml(&fixture(), &PumlOptions::default());

        assert!(output.contains("class Bygning_adresse {"));
        assert!(output.contains("Bygning *-- Bygning_adresse : adresse [0..*]"));
        assert!(output.contains("  + adresse.gatenavn : CharacterString"));
    }

    #[test]
    fn test_codelist_enum_block() {
        let output = render_feature_types_to_puml(&fixture(), &PumlOptions::default());

        assert!(output.contains("enum Bygningsstatus <<codeList>> {"));
        assert!(output.contains("  1 : Planlagt"));
        assert!(output.contains("  2 : Revet"));
    }

    #[test]
    fn test_relationship_edges() {
        let output = render_feature_types_to_puml(&fixture(), &PumlOptions::default());

        assert!(output.contains("Byggverk <|-- Bygning"));
        assert!(output.contains("Bygning --> Eiendom : tilhører [0..*]"));
    }

    #[test]
    fn test_title_and_package_wrapping() {
        let options = PumlOptions {
            title: Some("Matrikkelen".to_string()),
            package: Some("Bygg og eiendom".to_string()),
            ..PumlOptions::default()
        };
        let output = render_feature_types_to_puml(&fixture(), &options);

        assert!(output.contains("title Matrikkelen"));
        assert!(output.contains("package \"Bygg og eiendom\" {"));
        assert!(output.contains("  class Bygning <<featureType>> {"));
    }

    #[test]
    fn test_notes_carry_description_and_geometry() {
        let output = render_feature_types_to_puml(&fixture(), &PumlOptions::default());

        assert!(output.contains("note right of Bygning"));
        assert!(output.contains("  Et byggverk."));
        assert!(output.contains("  Storage CRS: EPSG:25833"));
        assert!(output.contains("  CRS: EPSG:4258"));
    }

    #[test]
    fn test_map_type_table() {
        assert_eq!(map_type("string"), "CharacterString");
        assert_eq!(map_type("number"), "Real");
        assert_eq!(map_type("date-time (string)"), "DateTime");
        assert_eq!(map_type("geometry-multipolygon"), "GM_MultiSurface");
        assert_eq!(map_type("GM_Point"), "GM_Point");
        assert_eq!(map_type("Adresse"), "Adresse");
        assert_eq!(map_type(""), "Any");
    }
}
