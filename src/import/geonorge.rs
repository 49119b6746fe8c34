//! Geonorge dataset metadata import
//!
//! Converts records from the Geonorge catalogue API (`getdata`) into a
//! compact product-specification metadata mapping. The converter is purely
//! shape-driven: every section is built from the raw JSON and then deep
//! compacted, so absent source fields simply vanish from the output.

use serde_json::{Map, Value, json};

use crate::http::HttpGet;

use super::ImportError;

const API_URL_PREFIX: &str = "https://kartkatalog.geonorge.no/api/getdata/";

const KEYWORD_FIELDS: [&str; 10] = [
    "KeywordsTheme",
    "KeywordsPlace",
    "KeywordsInspire",
    "KeywordsInspirePriorityDataset",
    "KeywordsHighValueDataset",
    "KeywordsNationalInitiative",
    "KeywordsNationalTheme",
    "KeywordsOther",
    "KeywordsConcept",
    "KeywordsAdministrativeUnits",
];

const CONTACT_FIELDS: [&str; 4] = [
    "ContactOwner",
    "ContactMetadata",
    "ContactPublisher",
    "ContactDistributor",
];

const DISTRIBUTION_GROUPS: [&str; 9] = [
    "SelfDistribution",
    "RelatedDataset",
    "RelatedSerieDatasets",
    "RelatedDatasetSerie",
    "RelatedApplications",
    "RelatedServices",
    "RelatedServiceLayer",
    "RelatedViewServices",
    "RelatedDownloadServices",
];

/// Fetch the raw catalogue record for a metadata UUID.
///
/// A single-element array payload is unwrapped; anything that is not a JSON
/// object afterwards is rejected.
pub fn fetch_metadata(metadata_id: &str, getter: &dyn HttpGet) -> Result<Value, ImportError> {
    let url = format!("{API_URL_PREFIX}{metadata_id}");

    let response = getter.get(&url).map_err(|_| ImportError::Network {
        url: url.clone(),
        status: None,
    })?;
    if response.is_error() {
        return Err(ImportError::Network {
            url,
            status: response.status,
        });
    }

    let mut payload = response.json().ok_or_else(|| {
        ImportError::Structure("metadata response did not contain valid JSON".to_string())
    })?;

    if let Value::Array(items) = &payload
        && items.len() == 1
        && items[0].is_object()
    {
        payload = items[0].clone();
    }

    if !payload.is_object() {
        return Err(ImportError::Structure(
            "metadata response must be a JSON object".to_string(),
        ));
    }

    Ok(payload)
}

/// Fetch and convert in one step.
pub fn fetch_psdata(metadata_id: &str, getter: &dyn HttpGet) -> Result<Value, ImportError> {
    let metadata = fetch_metadata(metadata_id, getter)?;
    Ok(build_psdata(metadata_id, &metadata))
}

/// Convert a raw Geonorge record into the product-specification layout.
pub fn build_psdata(metadata_id: &str, metadata: &Value) -> Value {
    let (reference_systems, primary_crs) = extract_reference_systems(metadata);
    let spatial_extent = extract_spatial_extent(metadata, primary_crs.as_deref());

    compact_value(&json!({
        "identification": build_identification(metadata_id, metadata),
        "scope": {
            "level": normalize_string(first_truthy_field(metadata, &["HierarchyLevel", "Type"])),
            "extent": {
                "spatial": spatial_extent,
                "temporal": build_temporal_extent(metadata),
            },
            "legalConstraints": extract_legal_constraints(metadata),
        },
        "dataContent": build_data_content(metadata),
        "referenceSystems": {
            "spatialReferenceSystems": reference_systems,
            "spatialRepresentationType": normalize_string(metadata.get("SpatialRepresentation")),
        },
        "dataQuality": extract_quality(metadata),
        "maintenance": {
            "maintenanceFrequency": normalize_string(metadata.get("MaintenanceFrequency")),
            "maintenanceNote": normalize_string(metadata.get("SpecificUsage")),
            "status": normalize_string(metadata.get("Status")),
        },
        "portrayal": {
            "styleReferences": normalize_sequence(metadata.get("StyleReferences")),
            "defaultPortrayalNote": normalize_string(metadata.get("DefaultPortrayal")),
            "legendDescriptionUrl": normalize_string(metadata.get("LegendDescriptionUrl")),
        },
        "delivery": {
            "distributions": extract_distributions(metadata),
        },
        "metadata": build_metadata_section(metadata_id, metadata),
        "links": collect_links(metadata),
    }))
}

// --- sections -------------------------------------------------------------

fn build_identification(metadata_id: &str, metadata: &Value) -> Value {
    let uuid = normalize_string(metadata.get("Uuid"));
    let id = if uuid.is_empty() {
        metadata_id.to_string()
    } else {
        uuid
    };

    json!({
        "id": id,
        "title": select_first_string(&[
            metadata.get("NorwegianTitle"),
            metadata.get("EnglishTitle"),
            metadata.get("Title"),
        ]),
        "abstract": normalize_string(metadata.get("Abstract")),
        "purpose": normalize_string(metadata.get("Purpose")),
        "language": normalize_string(metadata.get("DatasetLanguage")),
        "keywords": collect_keywords(metadata),
        "topicCategories": collect_topic_categories(metadata),
        "dates": {
            "creation": parse_date(metadata.get("DatePublished")),
            "publication": parse_date(metadata.get("DatePublished")),
            "revision": parse_date(metadata.get("DateUpdated")),
            "metadata": parse_date(metadata.get("DateMetadataUpdated")),
        },
        "responsibleParties": collect_contacts(metadata),
        "organizationLogoUrl": normalize_string(metadata.get("OrganizationLogoUrl")),
        "supplementalInformation": normalize_string(metadata.get("SupplementalDescription")),
    })
}

fn build_temporal_extent(metadata: &Value) -> Value {
    let start = parse_date(metadata.get("DatePublished"));
    let end = parse_date(metadata.get("DateUpdated"));

    if start.is_none() && end.is_none() {
        return Value::Null;
    }

    let first = start.clone().or_else(|| end.clone());
    let second = end.or(start);

    json!({"interval": [[first, second]]})
}

fn build_data_content(metadata: &Value) -> Value {
    let mut feature_catalogue: Vec<Value> = Vec::new();

    match metadata.get("OperatesOn") {
        Some(Value::Array(items)) => {
            for item in items {
                if item.is_object() {
                    feature_catalogue.push(json!({
                        "title": normalize_string(item.get("Title")),
                        "identifier": normalize_string(item.get("Uuid")),
                    }));
                }
            }
        }
        Some(item @ Value::Object(_)) => {
            feature_catalogue.push(json!({
                "title": normalize_string(item.get("Title")),
                "identifier": normalize_string(item.get("Uuid")),
            }));
        }
        _ => {}
    }

    json!({
        "featureCatalogue": feature_catalogue,
        "usage": normalize_string(metadata.get("SpecificUsage")),
    })
}

fn build_metadata_section(metadata_id: &str, metadata: &Value) -> Value {
    let point_of_contact = match metadata.get("ContactMetadata") {
        Some(contact @ Value::Object(_)) => json!({
            "organization": select_first_string(&[
                contact.get("Organization"),
                contact.get("OrganizationEnglish"),
            ]),
            "email": normalize_string(contact.get("Email")),
            "role": normalize_string(contact.get("Role")),
        }),
        _ => Value::Null,
    };

    let uuid = normalize_string(metadata.get("Uuid"));
    let code = if uuid.is_empty() {
        metadata_id.to_string()
    } else {
        uuid
    };

    json!({
        "standard": normalize_string(metadata.get("MetadataStandard")),
        "standardVersion": normalize_string(metadata.get("MetadataStandardVersion")),
        "metadataDate": parse_date(metadata.get("DateMetadataUpdated")),
        "language": normalize_string(metadata.get("MetadataLanguage")),
        "pointOfContact": point_of_contact,
        "identifiers": [{"authority": "geonorge", "code": code}],
        "metadataUrl": normalize_string(metadata.get("MetadataXmlUrl")),
        "landingPage": select_first_string(&[
            metadata.get("LandingPage"),
            metadata.get("LandingPageUrl"),
            metadata.get("Landingpage"),
        ]),
    })
}

// --- keywords, categories, contacts ---------------------------------------

fn collect_keywords(metadata: &Value) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for field in KEYWORD_FIELDS {
        if let Some(value) = metadata.get(field) {
            collect_keyword_values(value, &mut keywords);
        }
    }

    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .collect()
}

fn collect_keyword_values(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(_) => {
            let extracted = select_first_string(&[
                value.get("KeywordValue"),
                value.get("EnglishKeyword"),
                value.get("Keyword"),
                value.get("Title"),
                value.get("Name"),
                value.get("Value"),
            ]);
            if !extracted.is_empty() {
                out.push(extracted);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_keyword_values(item, out);
            }
        }
        Value::String(text) => {
            for part in text.replace(';', ",").split(',') {
                let part = part.trim();
                if !part.is_empty() {
                    out.push(part.to_string());
                }
            }
        }
        other => {
            if is_truthy(other) {
                let text = normalize_string(Some(other));
                if !text.is_empty() {
                    out.push(text);
                }
            }
        }
    }
}

fn collect_topic_categories(metadata: &Value) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for field in ["TopicCategories", "TopicCategory"] {
        match metadata.get(field) {
            Some(Value::Array(items)) => {
                for item in items {
                    let text = normalize_string(Some(item));
                    if !text.is_empty() && seen.insert(text.to_lowercase()) {
                        categories.push(text);
                    }
                }
            }
            value => {
                let text = normalize_string(value);
                if !text.is_empty() && seen.insert(text.to_lowercase()) {
                    categories.push(text);
                }
            }
        }
    }

    categories
}

fn collect_contacts(metadata: &Value) -> Vec<Value> {
    let mut contacts = Vec::new();

    for field in CONTACT_FIELDS {
        let Some(contact @ Value::Object(_)) = metadata.get(field) else {
            continue;
        };
        let entry = compact_value(&json!({
            "name": normalize_string(contact.get("Name")),
            "organization": select_first_string(&[
                contact.get("Organization"),
                contact.get("OrganizationEnglish"),
            ]),
            "email": normalize_string(contact.get("Email")),
            "role": normalize_string(contact.get("Role")),
        }));
        if has_value(&entry) {
            contacts.push(entry);
        }
    }

    contacts
}

// --- spatial / reference systems ------------------------------------------

fn extract_spatial_extent(metadata: &Value, default_crs: Option<&str>) -> Value {
    let mut extent = Map::new();

    let scope = normalize_string(metadata.get("SpatialScope"));
    if !scope.is_empty() {
        extent.insert("spatialScope".to_string(), json!(scope));
    }

    if let Some(bbox @ Value::Object(_)) = metadata.get("BoundingBox") {
        let corners = [
            coordinate(bbox.get("WestBoundLongitude")),
            coordinate(bbox.get("SouthBoundLatitude")),
            coordinate(bbox.get("EastBoundLongitude")),
            coordinate(bbox.get("NorthBoundLatitude")),
        ];
        if let [Some(west), Some(south), Some(east), Some(north)] = corners {
            extent.insert("bbox".to_string(), json!([west, south, east, north]));

            let mut bounding_box = Map::new();
            bounding_box.insert("west".to_string(), json!(west));
            bounding_box.insert("south".to_string(), json!(south));
            bounding_box.insert("east".to_string(), json!(east));
            bounding_box.insert("north".to_string(), json!(north));

            let crs = match default_crs {
                Some(crs) => crs.to_string(),
                None => match metadata.get("ReferenceSystem") {
                    Some(reference @ Value::Object(_)) => {
                        extract_epsg_code(reference.get("CoordinateSystemUrl"))
                            .unwrap_or_else(|| {
                                normalize_string(reference.get("CoordinateSystem"))
                            })
                    }
                    value => normalize_string(value),
                },
            };
            if !crs.is_empty() {
                bounding_box.insert("crs".to_string(), json!(crs));
            }

            extent.insert("boundingBox".to_string(), Value::Object(bounding_box));
        }
    }

    Value::Object(extent)
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn extract_reference_systems(metadata: &Value) -> (Vec<Value>, Option<String>) {
    let mut candidates: Vec<&Value> = Vec::new();
    if let Some(Value::Array(items)) = metadata.get("ReferenceSystems") {
        candidates.extend(items.iter());
    }
    if let Some(reference @ Value::Object(_)) = metadata.get("ReferenceSystem") {
        candidates.push(reference);
    }

    let mut systems = Vec::new();
    let mut primary_code: Option<String> = None;

    for candidate in candidates {
        if !candidate.is_object() {
            continue;
        }
        let code = extract_epsg_code(candidate.get("CoordinateSystemUrl"));
        let name = normalize_string(candidate.get("CoordinateSystem"));
        let entry = compact_value(&json!({"code": code, "name": name}));
        if has_value(&entry) {
            if primary_code.is_none() {
                primary_code = code.clone();
            }
            systems.push(entry);
        }
    }

    (systems, primary_code)
}

/// Derive an `EPSG:<n>` code from a registry URL. URLs whose trailing
/// segment is not numeric pass through verbatim.
fn extract_epsg_code(url: Option<&Value>) -> Option<String> {
    let text = normalize_string(url);
    if text.is_empty() {
        return None;
    }

    let candidate = text.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("EPSG:{candidate}"));
    }

    Some(text)
}

fn extract_legal_constraints(metadata: &Value) -> Value {
    let Some(constraints @ Value::Object(_)) = metadata.get("Constraints") else {
        return Value::Null;
    };

    json!({
        "useLimitation": normalize_string(constraints.get("UseLimitations")),
        "accessConstraints": normalize_string(constraints.get("AccessConstraints")),
        "useConstraints": normalize_string(constraints.get("UseConstraints")),
        "license": select_first_string(&[
            constraints.get("OtherConstraintsLinkText"),
            constraints.get("OtherConstraintsAccess"),
        ]),
        "licenseUrl": normalize_string(constraints.get("OtherConstraintsLink")),
        "securityConstraints": normalize_string(constraints.get("SecurityConstraints")),
    })
}

fn extract_quality(metadata: &Value) -> Value {
    let mut elements: Vec<Value> = Vec::new();

    if let Some(Value::Array(specs)) = metadata.get("QualitySpecifications") {
        for spec in specs {
            if !spec.is_object() {
                continue;
            }
            let entry = compact_value(&json!({
                "name": normalize_string(spec.get("Title")),
                "measure": normalize_string(spec.get("Explanation")),
                "result": normalize_string(spec.get("QuantitativeResult")),
            }));
            if has_value(&entry) {
                elements.push(entry);
            }
        }
    }

    if let Some(Value::Object(quantitative)) = metadata.get("QuantitativeResult") {
        for (key, value) in quantitative {
            let entry = compact_value(&json!({
                "name": key.trim(),
                "result": normalize_string(Some(value)),
            }));
            if has_value(&entry) {
                elements.push(entry);
            }
        }
    }

    json!({
        "scope": {
            "level": normalize_string(first_truthy_field(metadata, &["HierarchyLevel", "Type"])),
        },
        "qualityElements": elements,
        "lineage": {
            "statement": normalize_string(metadata.get("SupplementalDescription")),
        },
    })
}

// --- distributions and links ----------------------------------------------

fn extract_distributions(metadata: &Value) -> Vec<Value> {
    let mut distributions: Vec<Value> = Vec::new();

    let protocol = normalize_string(metadata.get("DistributionProtocol"));
    let distribution_url = normalize_string(metadata.get("DistributionUrl"));
    let download_url = normalize_string(metadata.get("DownloadUrl"));

    if !protocol.is_empty() || !distribution_url.is_empty() || !download_url.is_empty() {
        let href = if distribution_url.is_empty() {
            download_url
        } else {
            distribution_url
        };
        distributions.push(json!({
            "format": {"format": protocol},
            "access": {"href": href, "protocol": protocol},
        }));
    }

    if let Some(details @ Value::Object(_)) = metadata.get("DistributionDetails") {
        let protocol_name = normalize_string(details.get("ProtocolName"));
        distributions.push(json!({
            "title": protocol_name,
            "format": {"format": protocol_name},
            "access": {
                "href": normalize_string(details.get("URL")),
                "protocol": normalize_string(details.get("Protocol")),
            },
        }));
    }

    if let Some(nested @ Value::Object(_)) = metadata.get("Distributions") {
        for group in DISTRIBUTION_GROUPS {
            let Some(Value::Array(items)) = nested.get(group) else {
                continue;
            };
            for item in items {
                if !item.is_object() {
                    continue;
                }
                let access_href = select_first_string(&[
                    item.get("DistributionUrl"),
                    item.get("MapUrl"),
                ]);
                distributions.push(json!({
                    "title": normalize_string(item.get("Title")),
                    "format": {
                        "format": extract_distribution_format(item.get("DistributionFormats")),
                    },
                    "access": {
                        "href": access_href,
                        "protocol": normalize_string(item.get("Protocol")),
                        "license": normalize_string(item.get("DataAccess")),
                    },
                    "notes": normalize_string(item.get("TypeTranslated")),
                }));
            }
        }
    }

    distributions
        .into_iter()
        .map(|entry| compact_value(&entry))
        .filter(has_value)
        .collect()
}

fn extract_distribution_format(value: Option<&Value>) -> String {
    match value {
        Some(mapping @ Value::Object(_)) => {
            select_first_string(&[mapping.get("Name"), mapping.get("Format")])
        }
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| extract_distribution_format(Some(item)))
            .find(|format| !format.is_empty())
            .unwrap_or_default(),
        other => normalize_string(other),
    }
}

fn collect_links(metadata: &Value) -> Vec<Value> {
    let mut links: Vec<Value> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut add_link =
        |href: Option<&Value>, rel: &str, link_type: &str, title: &str| {
            let url = normalize_string(href);
            if url.is_empty() || !seen.insert(url.clone()) {
                return;
            }
            let link = compact_value(&json!({
                "href": url,
                "rel": rel,
                "type": link_type,
                "title": title,
            }));
            if has_value(&link) {
                links.push(link);
            }
        };

    add_link(
        metadata.get("MetadataXmlUrl"),
        "describedby",
        "application/xml",
        "Metadata (ISO 19139)",
    );
    add_link(metadata.get("ProductPageUrl"), "about", "text/html", "Produktside");
    add_link(metadata.get("DownloadUrl"), "enclosure", "text/html", "Nedlasting");
    add_link(metadata.get("DistributionUrl"), "enclosure", "text/html", "Distribusjon");
    add_link(metadata.get("MapLink"), "alternate", "text/html", "Kartvisning");
    add_link(metadata.get("ServiceLink"), "service", "text/html", "Tjeneste");
    add_link(
        metadata.get("ServiceDistributionUrlForDataset"),
        "service",
        "application/xml",
        "Tjeneste-distribusjon",
    );

    if let Some(details @ Value::Object(_)) = metadata.get("DistributionDetails") {
        let protocol_name = normalize_string(details.get("ProtocolName"));
        let title = if protocol_name.is_empty() {
            "Distribusjon".to_string()
        } else {
            protocol_name
        };
        add_link(details.get("URL"), "enclosure", "text/html", &title);
    }

    if let Some(nested @ Value::Object(_)) = metadata.get("Distributions") {
        for group in DISTRIBUTION_GROUPS {
            let Some(Value::Array(items)) = nested.get(group) else {
                continue;
            };
            for item in items {
                if !item.is_object() {
                    continue;
                }
                let protocol = normalize_string(item.get("Protocol"));
                let link_type = if protocol.is_empty() {
                    "text/html".to_string()
                } else {
                    protocol
                };
                let title = select_first_string(&[
                    item.get("Title"),
                    item.get("TypeTranslated"),
                ]);
                let href = match item.get("DistributionUrl") {
                    Some(value) if is_truthy(value) => Some(value),
                    _ => item.get("MapUrl"),
                };
                add_link(href, "alternate", &link_type, &title);
            }
        }
    }

    links
}

// --- scalar helpers -------------------------------------------------------

fn select_first_string(values: &[Option<&Value>]) -> String {
    values
        .iter()
        .map(|value| normalize_string(*value))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn normalize_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn normalize_sequence(value: Option<&Value>) -> Vec<String> {
    if let Some(Value::Array(items)) = value {
        return items
            .iter()
            .map(|item| normalize_string(Some(item)))
            .filter(|text| !text.is_empty())
            .collect();
    }

    let text = normalize_string(value);
    if text.is_empty() {
        return Vec::new();
    }
    if text.contains(',') || text.contains(';') {
        return text
            .replace(';', ",")
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();
    }
    vec![text]
}

fn first_truthy_field<'a>(metadata: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| metadata.get(*key))
        .find(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Normalize a Geonorge date string to `YYYY-MM-DD`. Unparseable values
/// pass through untouched; missing values become `None`.
fn parse_date(value: Option<&Value>) -> Option<String> {
    let text = normalize_string(value);
    if text.is_empty() {
        return None;
    }

    let sanitized = text.replace('Z', "");
    if let Ok(date) = sanitized.parse::<chrono::NaiveDate>() {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(datetime) = sanitized.parse::<chrono::NaiveDateTime>() {
        return Some(datetime.date().format("%Y-%m-%d").to_string());
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(&text) {
        return Some(datetime.date_naive().format("%Y-%m-%d").to_string());
    }

    if let Some(candidate) = text.get(..10)
        && candidate.parse::<chrono::NaiveDate>().is_ok()
    {
        return Some(candidate.to_string());
    }

    Some(text)
}

// --- deep compaction ------------------------------------------------------

/// Recursively drop empty strings, empty collections and nulls.
fn compact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut compacted = Map::new();
            for (key, entry) in map {
                let cleaned = compact_value(entry);
                if has_value(&cleaned) {
                    compacted.insert(key.clone(), cleaned);
                }
            }
            Value::Object(compacted)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(compact_value)
                .filter(has_value)
                .collect(),
        ),
        other => other.clone(),
    }
}

fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::String(text) => !text.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => items.iter().any(has_value),
        Value::Number(_) => true,
    }
}
