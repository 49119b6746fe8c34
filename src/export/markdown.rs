//! Markdown rendering of feature types
//!
//! Produces one section per feature type: a heading, the normalized
//! description, a geometry metadata paragraph, one small HTML table per
//! attribute (flattened with dotted names) and a relationships block. The
//! Norwegian labels match the catalogue pages the output is embedded in.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{Attribute, FeatureType, Geometry, Relationships, ValueDomain};

static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static HTML_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&lt;br\s*/?&gt;").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://[^\s<>()]+").unwrap());
static LINE_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', ';', '!', '?', ')', ']'];

/// Rendering knobs for [`render_feature_types_to_markdown`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Heading level of each feature type section (clamped to at least 1)
    pub heading_level: usize,
    pub include_descriptions: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            heading_level: 4,
            include_descriptions: true,
        }
    }
}

/// Convert feature types into Markdown sections.
pub fn render_feature_types_to_markdown(
    feature_types: &[FeatureType],
    options: &MarkdownOptions,
) -> String {
    let heading_prefix = "#".repeat(options.heading_level.max(1));

    let mut sections: Vec<String> = Vec::new();
    for feature_type in feature_types {
        let mut name = feature_type.name.trim().to_string();
        if name.is_empty() {
            name = "Unnamed feature type".to_string();
        }
        if feature_type.is_abstract {
            name = format!("{name} (abstrakt)");
        }
        let mut lines: Vec<String> = vec![format!("{heading_prefix} {name}")];

        let mut paragraphs: Vec<String> = Vec::new();
        if options.include_descriptions {
            let normalized = normalize_text(&feature_type.description);
            if !normalized.is_empty() {
                paragraphs.push(normalized);
            }
            if let Some(geometry) = &feature_type.geometry {
                let metadata = format_geometry_metadata(geometry);
                if !metadata.is_empty() {
                    paragraphs.push(metadata);
                }
            }
        }
        for paragraph in &paragraphs {
            lines.push(String::new());
            lines.push(linkify(paragraph));
        }

        let mut rows = flatten_attributes(&feature_type.attributes, "");
        inject_geometry_rows(
            &mut rows,
            feature_type.geometry.as_ref(),
            options.include_descriptions,
        );
        if let Some(geometry) = &feature_type.geometry
            && !rows.iter().any(|row| row.name == "geometry")
        {
            rows.insert(0, build_geometry_row(geometry));
        }

        lines.push(String::new());
        lines.extend(build_table(&rows, options.include_descriptions));

        if let Some(relationships) = &feature_type.relationships {
            let relationship_lines = build_relationships(relationships);
            if !relationship_lines.is_empty() {
                lines.push(String::new());
                lines.push("Relasjoner".to_string());
                lines.extend(relationship_lines);
            }
        }

        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}

#[derive(Debug, Clone, Default)]
struct AttributeRow {
    name: String,
    type_tag: String,
    cardinality: String,
    description: Option<String>,
    ogc_role: Option<Value>,
    value_domain: Option<ValueDomain>,
}

fn flatten_attributes(attributes: &[Attribute], prefix: &str) -> Vec<AttributeRow> {
    let mut rows = Vec::new();

    for attribute in attributes {
        let name = attribute.name.trim();
        let full_name = if !prefix.is_empty() && !name.is_empty() {
            format!("{prefix}.{name}")
        } else if !prefix.is_empty() {
            prefix.to_string()
        } else {
            name.to_string()
        };

        rows.push(AttributeRow {
            name: full_name.clone(),
            type_tag: attribute.attribute_type.trim().to_string(),
            cardinality: attribute.cardinality.trim().to_string(),
            description: attribute.description.clone(),
            ogc_role: attribute.ogc_role.clone(),
            value_domain: attribute.value_domain.clone(),
        });

        if !attribute.attributes.is_empty() {
            let child_prefix = if full_name.is_empty() { prefix } else { &full_name };
            rows.extend(flatten_attributes(&attribute.attributes, child_prefix));
        }
    }

    rows
}

/// Rewrite geometry-typed rows in place: normalize the type tag, attach the
/// geometry metadata paragraph and move the primary geometry to the front
/// under the fixed name `geometry`.
fn inject_geometry_rows(
    rows: &mut Vec<AttributeRow>,
    geometry: Option<&Geometry>,
    include_descriptions: bool,
) {
    let metadata_description = match geometry {
        Some(geometry) if include_descriptions => format_geometry_metadata(geometry),
        _ => String::new(),
    };

    let mut primary_index: Option<usize> = None;
    for (index, row) in rows.iter_mut().enumerate() {
        if row.type_tag.to_lowercase().starts_with("geometry") {
            row.type_tag = normalize_geometry_type(&row.type_tag);

            if !include_descriptions {
                row.description = None;
            } else if !metadata_description.is_empty() {
                match &row.description {
                    Some(existing) if !existing.trim().is_empty() => {
                        row.description =
                            Some(format!("{existing}\n\n{metadata_description}"));
                    }
                    _ => row.description = Some(metadata_description.clone()),
                }
            }

            if row.ogc_role.as_ref().and_then(Value::as_str) == Some("primary-geometry") {
                row.name = "geometry".to_string();
                if !metadata_description.is_empty() {
                    row.description = Some(metadata_description.clone());
                }
                primary_index.get_or_insert(index);
            }
        } else if !include_descriptions {
            row.description = None;
        }
    }

    if let Some(index) = primary_index {
        let primary = rows.remove(index);
        rows.insert(0, primary);
    }
}

fn normalize_geometry_type(type_tag: &str) -> String {
    if type_tag.to_lowercase().starts_with("geometry") {
        "geometry-any".to_string()
    } else {
        type_tag.to_string()
    }
}

/// Synthetic `geometry` row for feature types whose geometry is only carried
/// in the geometry object, not in the attribute tree.
fn build_geometry_row(geometry: &Geometry) -> AttributeRow {
    let mut type_tag = "geometry".to_string();

    if let Some(format) = &geometry.format
        && !format.trim().is_empty()
    {
        type_tag = format.trim().to_string();
    }

    let candidate = geometry.geometry_type.trim();
    if !candidate.is_empty() && !matches!(candidate.to_lowercase().as_str(), "feature" | "unknown")
    {
        type_tag = candidate.to_string();
    }

    let geometry_types: Vec<String> = geometry
        .types
        .iter()
        .flatten()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect();
    if !geometry_types.is_empty() && matches!(type_tag.to_lowercase().as_str(), "feature" | "geometry")
    {
        type_tag = geometry_types.join(" | ");
    }

    let mut description_parts: Vec<String> = Vec::new();
    if !geometry_types.is_empty() && geometry_types.join(" | ") != type_tag {
        description_parts.push(format!("Typer: {}", geometry_types.join(", ")));
    }
    if let Some(item_type) = &geometry.item_type
        && !item_type.trim().is_empty()
    {
        description_parts.push(format!("Elementtype: {}", item_type.trim()));
    }

    AttributeRow {
        name: "geometry".to_string(),
        type_tag,
        description: if description_parts.is_empty() {
            None
        } else {
            Some(description_parts.join("<br />"))
        },
        ogc_role: geometry.ogc_role.clone(),
        ..AttributeRow::default()
    }
}

fn format_geometry_metadata(geometry: &Geometry) -> String {
    let mut lines: Vec<String> = vec!["Geometri:".to_string()];

    let item_type = geometry
        .item_type
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    let geometry_type = geometry.geometry_type.trim();

    if !item_type.is_empty() {
        lines.push(format!("Elementtype: {item_type}"));
    }
    if !geometry_type.is_empty() && (item_type.is_empty() || geometry_type != item_type) {
        lines.push(format!("Type: {geometry_type}"));
    }

    if let Some(storage_crs) = geometry.storage_crs.as_deref().map(str::trim)
        && !storage_crs.is_empty()
    {
        lines.push("Lagrings-CRS:".to_string());
        lines.push(format!("\u{2022} {storage_crs}"));
    }

    let crs_values: Vec<&str> = geometry
        .crs
        .iter()
        .flatten()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();
    if !crs_values.is_empty() {
        lines.push("Koordinatreferansesystem (crs):".to_string());
        lines.extend(crs_values.iter().map(|value| format!("\u{2022} {value}")));
    }

    if lines.len() == 1 {
        return String::new();
    }
    lines.join("<br />")
}

fn format_listed_values(value_domain: &ValueDomain) -> String {
    let mut bullets: Vec<String> = Vec::new();

    if let Some(code_list) = value_domain.code_list.as_deref().map(str::trim)
        && !code_list.is_empty()
    {
        bullets.push(format!("Kodeliste: {code_list}"));
    }

    for entry in &value_domain.listed_values {
        let value = scalar_text(&entry.value);
        let label = entry.label.trim();
        if value.is_empty() && label.is_empty() {
            continue;
        }
        if !value.is_empty() && !label.is_empty() && label != value {
            bullets.push(format!("{value} \u{2013} {label}"));
        } else if !value.is_empty() {
            bullets.push(value);
        } else {
            bullets.push(label.to_string());
        }
    }

    if bullets.is_empty() {
        return String::new();
    }
    bullets
        .iter()
        .map(|bullet| format!("- {bullet}"))
        .collect::<Vec<_>>()
        .join("<br />")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn build_table(rows: &[AttributeRow], include_descriptions: bool) -> Vec<String> {
    let mut lines = vec!["Egenskaper".to_string()];

    if rows.is_empty() {
        lines.push(String::new());
        lines.push("(ingen)".to_string());
        return lines;
    }

    for row in rows {
        let name = escape_html(&row.name, false);
        let type_tag = escape_html(&row.type_tag, false);
        let cardinality = escape_html(&row.cardinality, false);

        let description = match &row.description {
            Some(description) if include_descriptions => {
                escape_html(&normalize_text(description), true)
            }
            _ => String::new(),
        };
        let value_domain = match &row.value_domain {
            Some(value_domain) => escape_html(&format_listed_values(value_domain), true),
            None => String::new(),
        };
        let ogc_role = match &row.ogc_role {
            Some(Value::String(role)) => escape_html(role, false),
            Some(other) => escape_html(&other.to_string(), false),
            None => String::new(),
        };

        lines.push(String::new());
        lines.push(r#"<table class="feature-attribute-table">"#.to_string());
        lines.push("  <colgroup>".to_string());
        lines.push(r#"    <col style="width: 35%;" />"#.to_string());
        lines.push(r#"    <col style="width: 65%;" />"#.to_string());
        lines.push("  </colgroup>".to_string());
        lines.push("  <tbody>".to_string());

        let strong_name = if name.is_empty() {
            String::new()
        } else {
            format!("<strong>{name}</strong>")
        };
        lines.push("    <tr>".to_string());
        lines.push(r#"      <th scope="row">Navn:</th>"#.to_string());
        lines.push(format!("      <td>{strong_name}</td>"));
        lines.push("    </tr>".to_string());

        let field_rows = [
            ("Definisjon:", description),
            ("Multiplisitet:", cardinality),
            ("Type:", type_tag),
            ("Tillatte verdier:", value_domain),
            ("OGC-rolle:", ogc_role),
        ];
        for (label, value) in field_rows {
            if value.is_empty() {
                continue;
            }
            lines.push("    <tr>".to_string());
            lines.push(format!(r#"      <th scope="row">{label}</th>"#));
            lines.push(format!("      <td>{value}</td>"));
            lines.push("    </tr>".to_string());
        }

        lines.push("  </tbody>".to_string());
        lines.push("</table>".to_string());
    }

    lines
}

fn build_relationships(relationships: &Relationships) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    let inherited: Vec<&str> = relationships
        .inheritance
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .collect();
    if !inherited.is_empty() {
        lines.push(String::new());
        lines.push("**Arv**".to_string());
        lines.push(inherited.join(", "));
    }

    let mut association_lines: Vec<String> = Vec::new();
    for association in &relationships.associations {
        let target = association.target.trim();
        if target.is_empty() {
            continue;
        }
        let mut parts = vec![target.to_string()];
        if let Some(role) = association.role.as_deref().map(str::trim)
            && !role.is_empty()
        {
            parts.push(format!("rolle: {role}"));
        }
        if let Some(cardinality) = association.cardinality.as_deref().map(str::trim)
            && !cardinality.is_empty()
        {
            parts.push(format!("kardinalitet: {cardinality}"));
        }
        association_lines.push(parts.join(" \u{2013} "));
    }
    if !association_lines.is_empty() {
        lines.push(String::new());
        lines.push("**Assosiasjoner**".to_string());
        lines.extend(association_lines);
    }

    lines
}

// --- text helpers ---------------------------------------------------------

/// Strip HTML tags, decode entities and collapse whitespace, keeping
/// intentional line breaks as `<br />`.
fn normalize_text(value: &str) -> String {
    let text = unescape_entities(value);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = BR_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = text.trim();
    let text = LINE_WS_RE.replace_all(text, "\n");
    text.replace('\n', "<br />")
}

fn unescape_entities(value: &str) -> String {
    match quick_xml::escape::unescape(value) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => value.to_string(),
    }
}

fn escape_html(value: &str, preserve_breaks: bool) -> String {
    let text = value.trim();
    if text.is_empty() {
        return String::new();
    }

    let mut escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    if preserve_breaks {
        escaped = HTML_BREAK_RE.replace_all(&escaped, "<br />").into_owned();
    }
    linkify(&escaped)
}

/// Wrap bare http(s) URLs in anchor tags, leaving trailing punctuation
/// outside the link.
fn linkify(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    URL_RE
        .replace_all(text, |captures: &regex::Captures| {
            let matched = captures.get(0).map(|m| m.as_str()).unwrap_or("");
            let url = matched.trim_end_matches(TRAILING_PUNCTUATION);
            if url.is_empty() {
                return matched.to_string();
            }
            let suffix = &matched[url.len()..];
            format!(r#"<a href="{url}">{url}</a>{suffix}"#)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Association, ListedValue};
    use serde_json::json;

    fn sample_feature_type() -> FeatureType {
        let mut status = Attribute::new("status", "string");
        status.cardinality = "0..1".to_string();
        status.description = Some("Status for bygget.<br/>Se https://example.com/koder.".to_string());
        status.value_domain = Some(ValueDomain {
            code_list: Some("https://register.test/status".to_string()),
            ..ValueDomain::enumeration(vec![
                ListedValue::new("1", "Planlagt"),
                ListedValue::new("2", "2"),
            ])
        });

        let mut address = Attribute::new("adresse", "object");
        address.attributes.push(Attribute::new("gatenavn", "string"));

        let mut feature = FeatureType::new("Bygning");
        feature.is_abstract = true;
        feature.description = "<p>Et bygg.</p>".to_string();
        feature.geometry = Some(Geometry {
            geometry_type: "Polygon".to_string(),
            storage_crs: Some("EPSG:25833".to_string()),
            crs: Some(vec!["EPSG:4258".to_string()]),
            ..Geometry::default()
        });
        feature.attributes = vec![status, address];
        feature.relationships = Some(Relationships {
            inheritance: vec!["Byggverk".to_string()],
            associations: vec![Association {
                target: "Eiendom".to_string(),
                role: Some("tilhører".to_string()),
                cardinality: Some("0..*".to_string()),
            }],
        });
        feature
    }

    #[test]
    fn test_section_heading_and_description() {
        let output =
            render_feature_types_to_markdown(&[sample_feature_type()], &MarkdownOptions::default());

        assert!(output.starts_with("#### Bygning (abstrakt)"));
        assert!(output.contains("Et bygg."));
        assert!(!output.contains("<p>"));
        assert!(output.contains("Geometri:<br />Type: Polygon"));
        assert!(output.contains("Lagrings-CRS:"));
    }

    #[test]
    fn test_attribute_tables() {
        let output =
            render_feature_types_to_markdown(&[sample_feature_type()], &MarkdownOptions::default());

        assert!(output.contains("<strong>geometry</strong>"));
        assert!(output.contains("<strong>status</strong>"));
        // Nested attributes are flattened with dotted names.
        assert!(output.contains("<strong>adresse.gatenavn</strong>"));
        assert!(output.contains("<td>0..1</td>"));
        assert!(output.contains("- Kodeliste: <a href=\"https://register.test/status\">"));
        assert!(output.contains("- 1 \u{2013} Planlagt<br />- 2"));
        assert!(output.contains(r#"<a href="https://example.com/koder">"#));
    }

    #[test]
    fn test_relationships_block() {
        let output =
            render_feature_types_to_markdown(&[sample_feature_type()], &MarkdownOptions::default());

        assert!(output.contains("Relasjoner"));
        assert!(output.contains("**Arv**\nByggverk"));
        assert!(output.contains("Eiendom \u{2013} rolle: tilhører \u{2013} kardinalitet: 0..*"));
    }

    #[test]
    fn test_primary_geometry_attribute_moves_to_front() {
        let mut geom_attr = Attribute::new("grense", "geometry-polygon");
        geom_attr.ogc_role = Some(json!("primary-geometry"));
        let mut other = Attribute::new("nummer", "integer");
        other.cardinality = "1".to_string();

        let mut feature = FeatureType::new("Teig");
        feature.geometry = Some(Geometry {
            geometry_type: "Polygon".to_string(),
            ..Geometry::default()
        });
        feature.attributes = vec![other, geom_attr];

        let output =
            render_feature_types_to_markdown(&[feature], &MarkdownOptions::default());
        let geometry_pos = output.find("<strong>geometry</strong>").unwrap();
        let number_pos = output.find("<strong>nummer</strong>").unwrap();
        assert!(geometry_pos < number_pos);
        assert!(output.contains("<td>geometry-any</td>"));
    }

    #[test]
    fn test_without_attributes_and_descriptions() {
        let feature = FeatureType::new("Tom");
        let options = MarkdownOptions {
            include_descriptions: false,
            ..MarkdownOptions::default()
        };
        let output = render_feature_types_to_markdown(&[feature], &options);

        assert!(output.contains("Egenskaper"));
        assert!(output.contains("(ingen)"));
    }
}
