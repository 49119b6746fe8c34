//! OGC API - Features import
//!
//! Derives feature types from a `/collections` endpoint. The collections
//! document itself is mandatory; per-collection schema, queryables and detail
//! documents are enrichment only, so failures fetching them degrade the
//! output instead of aborting the import. Schemas may arrive as JSON Schema
//! or as a GML application schema (XSD).

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::http::{HttpGet, HttpResponse};
use crate::models::{Attribute, FeatureType, Geometry, ListedValue, ValueDomain, format_cardinality};

use super::ImportError;
use super::gml_schema::{looks_like_geometry_type, parse_gml_schema};
use super::resolver::{parse_attribute_type, resolve_attribute_details, resolve_json_pointer};

/// Geometry type names from the GeoJSON vocabulary (plus the generic GML
/// curve/surface names some services advertise).
const GEOJSON_GEOMETRY_NAMES: [&str; 11] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
    "Curve",
    "MultiCurve",
    "Surface",
    "MultiSurface",
];

/// Load feature types from an OGC API - Features collections endpoint.
///
/// # Arguments
///
/// * `collections_url` - Fully qualified URL of the `/collections` endpoint.
///   A landing page is also accepted; its `collections`/`data` link is
///   followed once.
/// * `getter` - HTTP collaborator used for every fetch.
///
/// # Returns
///
/// One `FeatureType` per collection, in document order.
///
/// # Errors
///
/// `ImportError::Network` when the primary fetch fails or responds with an
/// error status, `ImportError::Structure` when the payload has no usable
/// collections array or a collection lacks both `id` and `title`.
pub fn load_feature_types(
    collections_url: &str,
    getter: &dyn HttpGet,
) -> Result<Vec<FeatureType>, ImportError> {
    let response = getter.get(collections_url).map_err(|_| ImportError::Network {
        url: collections_url.to_string(),
        status: None,
    })?;
    if response.is_error() {
        return Err(ImportError::Network {
            url: collections_url.to_string(),
            status: response.status,
        });
    }

    let payload = response.json().ok_or_else(|| {
        ImportError::Structure("collections response did not contain valid JSON".to_string())
    })?;

    let mut collections = payload.get("collections").cloned();
    if collections.is_none() {
        if let Some(link) = find_collections_link(&payload)
            && let Some(follow) = load_json_mapping(&link, getter)
        {
            collections = follow.get("collections").cloned();
        }
        if collections.is_none() && payload.is_array() {
            collections = Some(payload.clone());
        }
    }

    let collections = match collections {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(ImportError::Structure(
                "collections response missing 'collections' array".to_string(),
            ));
        }
    };

    let mut feature_types = Vec::new();
    for collection in &collections {
        if !collection.is_object() {
            continue;
        }
        feature_types.push(build_feature_type(collection, getter)?);
    }

    Ok(feature_types)
}

fn build_feature_type(
    collection: &Value,
    getter: &dyn HttpGet,
) -> Result<FeatureType, ImportError> {
    let name_value = match collection.get("id") {
        Some(value) if truthy(value) => Some(value),
        _ => collection.get("title"),
    };
    let mut name = name_value
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ImportError::Structure("each collection must include an 'id' or 'title'".to_string())
        })?
        .to_string();

    let description = collection
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let mut schema_candidates: Vec<Value> = Vec::new();
    let mut additional_sources: Vec<Value> = Vec::new();

    let mut schema_url = find_schema_link(collection);
    let mut queryables_url = find_queryables_link(collection);

    if let Some(url) = &schema_url
        && let Some(schema) = load_schema(url, getter)
    {
        schema_candidates.push(schema);
    }

    if schema_url.is_none() || queryables_url.is_none() {
        if let Some(detail) = load_collection_detail(collection, getter) {
            if schema_url.is_none() {
                schema_url = find_schema_link(&detail);
                if let Some(url) = &schema_url
                    && let Some(schema) = load_schema(url, getter)
                {
                    schema_candidates.push(schema);
                }
            }
            if queryables_url.is_none() {
                queryables_url = find_queryables_link(&detail);
            }
            additional_sources.push(detail);
        }
    }

    if let Some(url) = &queryables_url
        && let Some(queryables) = load_schema(url, getter)
    {
        schema_candidates.push(queryables);
    }

    // The first schema is authoritative; the rest only fill gaps.
    let mut primary_schema: Option<Value> = None;
    if !schema_candidates.is_empty() {
        let mut candidates = schema_candidates.into_iter();
        primary_schema = candidates.next();
        let mut rest: Vec<Value> = candidates.collect();
        rest.append(&mut additional_sources);
        additional_sources = rest;
    }

    if let Some(schema) = &primary_schema
        && let Some(title) = schema
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|title| !title.is_empty())
    {
        name = title.to_string();
    }

    let geometry = extract_geometry(collection, primary_schema.as_ref(), &additional_sources);
    let attributes = extract_attributes(collection, primary_schema.as_ref(), &additional_sources);

    Ok(FeatureType {
        name,
        description,
        is_abstract: false,
        geometry: Some(geometry),
        attributes,
        relationships: None,
    })
}

// --- link discovery -------------------------------------------------------

fn find_schema_link(document: &Value) -> Option<String> {
    find_link_href(
        document,
        &[
            "http://www.opengis.net/def/rel/ogc/1.0/schema",
            "http://www.opengis.net/def/rel/ogc/0.0/schema",
            "describedby",
        ],
    )
}

fn find_queryables_link(document: &Value) -> Option<String> {
    find_link_href(
        document,
        &[
            "http://www.opengis.net/def/rel/ogc/1.0/queryables",
            "http://www.opengis.net/def/rel/ogc/0.0/queryables",
            "queryables",
        ],
    )
}

fn find_self_link(document: &Value) -> Option<String> {
    find_link_href(document, &["self"])
}

fn find_collections_link(document: &Value) -> Option<String> {
    find_link_href(
        document,
        &[
            "http://www.opengis.net/def/rel/ogc/1.0/collections",
            "http://www.opengis.net/def/rel/ogc/0.0/collections",
            "collections",
            "data",
        ],
    )
}

fn find_link_href(document: &Value, rel_candidates: &[&str]) -> Option<String> {
    let links = document.get("links")?.as_array()?;
    for link in links {
        let Some(link) = link.as_object() else {
            continue;
        };
        let rel = link.get("rel").and_then(Value::as_str).unwrap_or("");
        let href = link.get("href").and_then(Value::as_str).unwrap_or("");
        if !href.is_empty()
            && rel_candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(rel))
        {
            return Some(href.to_string());
        }
    }
    None
}

// --- tolerant secondary fetches -------------------------------------------

fn fetch_response(url: &str, getter: &dyn HttpGet) -> Option<HttpResponse> {
    match getter.get(url) {
        Ok(response) if !response.is_error() => Some(response),
        Ok(response) => {
            warn!(
                "Fetch of '{}' returned status {:?}, skipping",
                url, response.status
            );
            None
        }
        Err(err) => {
            warn!("Fetch of '{}' failed: {}", url, err);
            None
        }
    }
}

fn load_json_mapping(url: &str, getter: &dyn HttpGet) -> Option<Value> {
    fetch_response(url, getter)?
        .json()
        .filter(|payload| payload.is_object())
}

/// Load a schema document, accepting either JSON or a GML application
/// schema. XML is detected by URL suffix or content type.
fn load_schema(url: &str, getter: &dyn HttpGet) -> Option<Value> {
    let response = fetch_response(url, getter)?;

    if response.looks_like_xml(url)
        && let Some(text) = response.text()
        && let Some(schema) = parse_gml_schema(&text)
    {
        return Some(schema);
    }

    response.json().filter(|payload| payload.is_object())
}

fn load_collection_detail(collection: &Value, getter: &dyn HttpGet) -> Option<Value> {
    let self_link = find_self_link(collection)?;
    load_json_mapping(&self_link, getter)
}

// --- geometry extraction --------------------------------------------------

fn extract_geometry(collection: &Value, schema: Option<&Value>, extra_sources: &[Value]) -> Geometry {
    let mut geometry = Geometry::default();

    geometry.item_type = collection
        .get("itemType")
        .or_else(|| collection.get("item_type"))
        .and_then(Value::as_str)
        .filter(|item_type| !item_type.is_empty())
        .map(String::from);

    let mut documents: Vec<Value> = Vec::new();
    if let Some(schema) = schema {
        documents.push(schema.clone());
    }
    documents.push(collection.clone());
    for source in extra_sources {
        if source.is_object() {
            documents.push(source.clone());
        }
    }

    let definitions = collect_geometry_definitions(&documents);

    let geometry_types = collect_geometry_types(&definitions);
    let geometry_format = definitions.iter().find_map(|(details, _)| {
        details
            .get("format")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|format| !format.is_empty())
            .map(String::from)
    });

    if let Some((first, rest)) = geometry_types.split_first() {
        geometry.geometry_type = first.clone();
        if !rest.is_empty() {
            geometry.types = Some(geometry_types.clone());
        }
    } else if let Some(format) = &geometry_format {
        geometry.geometry_type = format.clone();
    } else if let Some(parsed) = select_geometry_type(&definitions, &documents) {
        geometry.geometry_type = parsed;
    } else if let Some(item_type) = &geometry.item_type {
        geometry.geometry_type = item_type.clone();
    }

    let mut crs_values: Vec<String> = Vec::new();
    if let Some(collection_crs) = collection.get("crs").and_then(Value::as_array) {
        for value in collection_crs {
            if let Some(text) = value.as_str()
                && !text.is_empty()
                && !crs_values.iter().any(|seen| seen == text)
            {
                crs_values.push(text.to_string());
            }
        }
    }
    if let Some(spatial) = collection
        .get("extent")
        .and_then(|extent| extent.get("spatial"))
    {
        let crs = spatial
            .get("crs")
            .and_then(Value::as_str)
            .filter(|crs| !crs.is_empty())
            .or_else(|| {
                spatial
                    .get("srs")
                    .and_then(Value::as_str)
                    .filter(|crs| !crs.is_empty())
            });
        if let Some(crs) = crs
            && !crs_values.iter().any(|seen| seen == crs)
        {
            crs_values.push(crs.to_string());
        }
    }
    if !crs_values.is_empty() {
        geometry.crs = Some(crs_values);
    }

    geometry.storage_crs = collection
        .get("storageCrs")
        .and_then(Value::as_str)
        .filter(|crs| !crs.is_empty())
        .map(String::from);

    geometry.format = geometry_format;

    geometry.ogc_role = definitions.iter().find_map(|(details, index)| {
        let mut seen = HashSet::new();
        extract_ogc_role(details, &documents, documents.get(*index), &mut seen)
    });

    if geometry.geometry_type.is_empty() {
        geometry.geometry_type = "Unknown".to_string();
    }

    geometry
}

/// Resolved geometry-bearing property definitions, each paired with the
/// index of the document it came from.
fn collect_geometry_definitions(documents: &[Value]) -> Vec<(Value, usize)> {
    let mut definitions = Vec::new();
    for (index, document) in documents.iter().enumerate() {
        let Some(container) = properties_container(document) else {
            continue;
        };
        for (name, details) in iter_attribute_definitions(Some(container)) {
            if !is_geometry_attribute(&name, &details) {
                continue;
            }
            let mut stack = HashSet::new();
            let resolved = resolve_attribute_details(&details, Some(document), documents, &mut stack);
            if resolved.is_object() {
                definitions.push((resolved, index));
            } else if details.is_object() {
                definitions.push((details, index));
            }
        }
    }
    definitions
}

fn collect_geometry_types(definitions: &[(Value, usize)]) -> Vec<String> {
    let mut types = Vec::new();
    for (details, _) in definitions {
        for name in extract_geojson_type_names(details) {
            if !types.contains(&name) {
                types.push(name);
            }
        }
    }
    types
}

fn select_geometry_type(definitions: &[(Value, usize)], documents: &[Value]) -> Option<String> {
    for (details, index) in definitions {
        let mut stack = HashSet::new();
        let candidate = parse_attribute_type(details, documents.get(*index), documents, &mut stack);
        let normalized = candidate.trim();
        if normalized.is_empty() {
            continue;
        }
        let lowered = normalized.to_lowercase();
        if lowered == "unknown" || lowered == "object" {
            continue;
        }
        if !GEOJSON_GEOMETRY_NAMES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(normalized))
            && !lowered.contains("geometry")
        {
            continue;
        }
        return Some(normalized.to_string());
    }
    None
}

fn extract_geojson_type_names(details: &Value) -> Vec<String> {
    let mut collected = Vec::new();
    walk_geojson_types(details, &mut collected);
    collected
}

fn walk_geojson_types(node: &Value, collected: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            if let Some(text) = map.get("geometryType").and_then(Value::as_str) {
                add_geojson_name(text, collected);
            }
            match map.get("type") {
                Some(Value::String(text)) => add_geojson_name(text, collected),
                Some(Value::Array(entries)) => {
                    for entry in entries {
                        if let Some(text) = entry.as_str() {
                            add_geojson_name(text, collected);
                        }
                    }
                }
                _ => {}
            }
            if let Some(enum_values) = map.get("enum").and_then(Value::as_array) {
                for value in enum_values {
                    if let Some(text) = value.as_str() {
                        add_geojson_name(text, collected);
                    }
                }
            }
            if let Some(text) = map.get("const").and_then(Value::as_str) {
                add_geojson_name(text, collected);
            }
            if let Some(properties) = map.get("properties").and_then(Value::as_object) {
                for key in ["type", "geometryType"] {
                    if let Some(property) = properties.get(key) {
                        walk_geojson_types(property, collected);
                    }
                }
            }
            if let Some(items) = map.get("items") {
                walk_geojson_types(items, collected);
            }
            for key in ["allOf", "anyOf", "oneOf"] {
                if let Some(group) = map.get(key).and_then(Value::as_array) {
                    for entry in group {
                        walk_geojson_types(entry, collected);
                    }
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                walk_geojson_types(entry, collected);
            }
        }
        _ => {}
    }
}

fn add_geojson_name(value: &str, collected: &mut Vec<String>) {
    if GEOJSON_GEOMETRY_NAMES.contains(&value) && !collected.iter().any(|seen| seen == value) {
        collected.push(value.to_string());
    }
}

fn is_geometry_attribute(name: &str, details: &Value) -> bool {
    if name == "geometry" {
        return true;
    }
    if !details.is_object() {
        return false;
    }
    let lowered = name.to_lowercase();
    if matches!(
        lowered.as_str(),
        "geom" | "geometry" | "shape" | "the_geom" | "wkb_geometry"
    ) {
        return true;
    }
    looks_like_geometry_type(details)
}

// --- attribute extraction -------------------------------------------------

/// Accumulated state for one attribute path. Several source documents may
/// describe the same path; the merge rules are "first pass wins" for
/// identity-like fields and widening for cardinality.
#[derive(Debug, Default)]
struct AttributeNode {
    type_tag: Option<String>,
    description: Option<String>,
    ogc_role: Option<Value>,
    value_domain: Option<ValueDomain>,
    required: Option<bool>,
    min_occurs: Option<i64>,
    max_occurs: Option<i64>,
    is_array: Option<bool>,
    children: IndexMap<String, AttributeNode>,
}

fn extract_attributes(
    collection: &Value,
    schema: Option<&Value>,
    extra_sources: &[Value],
) -> Vec<Attribute> {
    let mut documents: Vec<Value> = Vec::new();
    if let Some(schema) = schema {
        documents.push(schema.clone());
    }
    for source in extra_sources {
        if source.is_object() {
            documents.push(source.clone());
        }
    }
    documents.push(collection.clone());

    let mut roots: IndexMap<String, AttributeNode> = IndexMap::new();

    for source in &documents {
        let properties = properties_container(source);
        for (raw_name, details) in iter_attribute_definitions(properties) {
            if is_geometry_attribute(&raw_name, &details) {
                continue;
            }

            // Dotted names describe a nested path.
            let segments: Vec<String> = raw_name
                .split('.')
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect();
            let Some((first, rest)) = segments.split_first() else {
                continue;
            };

            let mut node = roots.entry(first.clone()).or_default();
            for segment in rest {
                if node.type_tag.is_none() {
                    node.type_tag = Some("object".to_string());
                }
                node = node.children.entry(segment.clone()).or_default();
            }

            update_attribute_node(node, &details, Some(source), &documents, &segments);
        }
    }

    roots
        .iter()
        .map(|(name, node)| node_to_attribute(name, node))
        .collect()
}

fn update_attribute_node(
    node: &mut AttributeNode,
    details: &Value,
    source: Option<&Value>,
    documents: &[Value],
    path: &[String],
) {
    if node.type_tag.is_none() {
        let mut stack = HashSet::new();
        node.type_tag = Some(parse_attribute_type(details, source, documents, &mut stack));
    }

    if node.description.is_none()
        && let Some(description) = extract_description(details)
    {
        node.description = Some(description);
    }

    if node.ogc_role.is_none() {
        let mut seen = HashSet::new();
        node.ogc_role = extract_ogc_role(details, documents, source, &mut seen);
    }

    let mut stack = HashSet::new();
    let resolved = resolve_attribute_details(details, source, documents, &mut stack);

    apply_cardinality_metadata(node, details, &resolved, source, path);

    if let Some(container) = properties_container(&resolved) {
        let children = iter_attribute_definitions(Some(container));
        if !children.is_empty() {
            node.type_tag = Some("object".to_string());
            for (child_name, child_details) in children {
                if child_name == "geometry" {
                    continue;
                }
                let mut child_path = path.to_vec();
                child_path.push(child_name.clone());
                let child_node = node.children.entry(child_name).or_default();
                update_attribute_node(
                    child_node,
                    &child_details,
                    Some(&resolved),
                    documents,
                    &child_path,
                );
            }
        }
    }

    if node.value_domain.is_none() {
        node.value_domain = extract_enumeration_domain(&resolved, node.type_tag.as_deref());
    }
}

fn apply_cardinality_metadata(
    node: &mut AttributeNode,
    raw: &Value,
    resolved: &Value,
    source: Option<&Value>,
    path: &[String],
) {
    let required_flag = extract_required_flag(raw)
        .or_else(|| extract_required_flag(resolved))
        .or_else(|| extract_required_from_document(source, path));
    if let Some(flag) = required_flag {
        node.required = Some(node.required.unwrap_or(false) || flag);
    }

    if let Some(min) = extract_min_occurs(raw).or_else(|| extract_min_occurs(resolved))
        && node.min_occurs.is_none_or(|current| min > current)
    {
        node.min_occurs = Some(min);
    }
    if let Some(max) = extract_max_occurs(raw).or_else(|| extract_max_occurs(resolved))
        && node.max_occurs.is_none_or(|current| max < current)
    {
        node.max_occurs = Some(max);
    }

    if let Some(flag) = determine_is_array(raw).or_else(|| determine_is_array(resolved)) {
        node.is_array = Some(node.is_array.unwrap_or(false) || flag);
    }

    // Array bounds tighten the occurrence window only for arrays.
    if node.is_array == Some(true) {
        if let Some(min_items) = extract_min_items(raw).or_else(|| extract_min_items(resolved))
            && node.min_occurs.is_none_or(|current| min_items > current)
        {
            node.min_occurs = Some(min_items);
        }
        if let Some(max_items) = extract_max_items(raw).or_else(|| extract_max_items(resolved))
            && node.max_occurs.is_none_or(|current| max_items < current)
        {
            node.max_occurs = Some(max_items);
        }
    }
}

fn node_to_attribute(name: &str, node: &AttributeNode) -> Attribute {
    let type_tag = match &node.type_tag {
        Some(tag) if !tag.is_empty() => tag.clone(),
        _ => if node.children.is_empty() {
            "unknown"
        } else {
            "object"
        }
        .to_string(),
    };

    let mut attribute = Attribute::new(name, type_tag.as_str());
    attribute.cardinality = node_cardinality(node, &type_tag);
    attribute.description = node.description.clone();
    attribute.ogc_role = node.ogc_role.clone();
    attribute.value_domain = node.value_domain.clone();
    attribute.attributes = node
        .children
        .iter()
        .map(|(child_name, child)| node_to_attribute(child_name, child))
        .collect();

    attribute
}

fn node_cardinality(node: &AttributeNode, type_tag: &str) -> String {
    let min_part = match node.min_occurs {
        Some(min) if min > 0 => "1",
        Some(_) => "0",
        None => {
            if node.required.unwrap_or(false) {
                "1"
            } else {
                "0"
            }
        }
    };

    let is_array = node
        .is_array
        .unwrap_or_else(|| type_tag.to_lowercase().contains("array"));
    let max_part = if is_array {
        match node.max_occurs {
            Some(max) if max <= 1 => "1",
            _ => "*",
        }
    } else {
        "1"
    };

    format_cardinality(min_part, max_part)
}

// --- schema field helpers -------------------------------------------------

fn properties_container(source: &Value) -> Option<&Value> {
    for key in [
        "properties",
        "itemProperties",
        "item_properties",
        "itemproperties",
    ] {
        if let Some(value) = source.get(key) {
            if !value.is_null() {
                return Some(value);
            }
        }
    }
    None
}

/// Attribute definitions in document order. Accepts both the mapping form
/// (`{"name": {...}}`) and the list form (`[{"name": "...", ...}]`).
fn iter_attribute_definitions(properties: Option<&Value>) -> Vec<(String, Value)> {
    let mut definitions = Vec::new();
    match properties {
        Some(Value::Object(map)) => {
            for (name, details) in map {
                definitions.push((name.clone(), details.clone()));
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                if entry.is_object()
                    && let Some(name) = entry.get("name").and_then(Value::as_str)
                {
                    definitions.push((name.to_string(), entry.clone()));
                }
            }
        }
        _ => {}
    }
    definitions
}

fn extract_description(details: &Value) -> Option<String> {
    let map = details.as_object()?;
    ["description", "title"].iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from)
    })
}

fn extract_required_flag(details: &Value) -> Option<bool> {
    let map = details.as_object()?;
    if let Some(flag) = map.get("required").and_then(coerce_to_bool) {
        return Some(flag);
    }
    extract_min_occurs(details).map(|min| min > 0)
}

/// Required status derived from the enclosing document's `required` array.
/// A present array that does not name a top-level attribute marks it as
/// explicitly optional.
fn extract_required_from_document(document: Option<&Value>, path: &[String]) -> Option<bool> {
    let map = document?.as_object()?;
    if path.is_empty() {
        return None;
    }

    let (required_names, present): (HashSet<&str>, bool) = match map.get("required") {
        Some(Value::Array(items)) => (
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| !name.is_empty())
                .collect(),
            true,
        ),
        _ => (HashSet::new(), false),
    };

    if !required_names.is_empty() {
        let joined = path.join(".");
        if required_names.contains(joined.as_str()) {
            return Some(true);
        }
        if path.len() == 1 && required_names.contains(path[0].as_str()) {
            return Some(true);
        }
    }

    if present && path.len() == 1 && !required_names.contains(path[0].as_str()) {
        return Some(false);
    }

    None
}

fn coerce_to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|number| number != 0.0),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn integer_field(details: &Value, keys: &[&str]) -> Option<i64> {
    let map = details.as_object()?;
    keys.iter().find_map(|key| map.get(*key).and_then(Value::as_i64))
}

fn extract_min_occurs(details: &Value) -> Option<i64> {
    integer_field(
        details,
        &["minOccurs", "min_occurs", "minoccurs", "minItems", "min_items", "minitems"],
    )
}

fn extract_max_occurs(details: &Value) -> Option<i64> {
    integer_field(
        details,
        &["maxOccurs", "max_occurs", "maxoccurs", "maxItems", "max_items", "maxitems"],
    )
}

fn extract_min_items(details: &Value) -> Option<i64> {
    integer_field(details, &["minItems", "min_items", "minitems"])
}

fn extract_max_items(details: &Value) -> Option<i64> {
    integer_field(details, &["maxItems", "max_items", "maxitems"])
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(entries) => !entries.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn first_truthy<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| truthy(value))
}

fn determine_is_array(details: &Value) -> Option<bool> {
    let map = details.as_object()?;

    match first_truthy(map, &["type", "dataType"]) {
        Some(Value::String(text)) if text.eq_ignore_ascii_case("array") => return Some(true),
        Some(Value::Array(entries)) => {
            if entries
                .iter()
                .any(|entry| entry.as_str().is_some_and(|text| text.eq_ignore_ascii_case("array")))
            {
                return Some(true);
            }
        }
        _ => {}
    }

    if map.contains_key("items") {
        return Some(true);
    }

    if let Some(value) = first_truthy(map, &["maxOccurs", "max_occurs", "maxoccurs"]) {
        if value
            .as_str()
            .is_some_and(|text| text.eq_ignore_ascii_case("unbounded"))
        {
            return Some(true);
        }
        if value.as_i64().is_some_and(|number| number > 1) {
            return Some(true);
        }
    }
    if let Some(value) = first_truthy(map, &["minOccurs", "min_occurs", "minoccurs"])
        && value.as_i64().is_some_and(|number| number > 1)
    {
        return Some(true);
    }

    None
}

// --- enumeration domains --------------------------------------------------

fn extract_enumeration_domain(details: &Value, attribute_type: Option<&str>) -> Option<ValueDomain> {
    if !details.is_object() {
        return None;
    }
    // Structured attributes carry their domain on the leaves instead.
    if attribute_type.is_some_and(|tag| tag.to_lowercase().contains("object")) {
        return None;
    }

    let mut values = Vec::new();
    let mut seen = HashSet::new();
    collect_enumeration_values(details, attribute_type, &mut values, &mut seen);

    if values.is_empty() {
        None
    } else {
        Some(ValueDomain::enumeration(values))
    }
}

fn collect_enumeration_values(
    node: &Value,
    attribute_type: Option<&str>,
    values: &mut Vec<ListedValue>,
    seen: &mut HashSet<(&'static str, String)>,
) {
    match node {
        Value::Object(map) => {
            if let Some(enum_values) = map.get("enum").and_then(Value::as_array) {
                let labels = extract_enum_labels(map, enum_values.len());
                for (index, enum_value) in enum_values.iter().enumerate() {
                    if !is_simple_enum_value(enum_value) {
                        continue;
                    }
                    let label = labels
                        .as_ref()
                        .and_then(|labels| labels.get(index))
                        .cloned()
                        .unwrap_or_else(|| scalar_label(enum_value));
                    push_enum_value(enum_value, label, values, seen);
                }
            }

            if let Some(const_value) = map.get("const")
                && is_simple_enum_value(const_value)
            {
                let label = const_entry_label(map, const_value);
                push_enum_value(const_value, label, values, seen);
            }

            let walk_items = attribute_type
                .is_some_and(|tag| tag.to_lowercase().contains("array"))
                || map.get("type").and_then(Value::as_str) == Some("array");
            if walk_items
                && let Some(items) = map.get("items")
            {
                collect_enumeration_values(items, attribute_type, values, seen);
            }

            for key in ["anyOf", "oneOf", "allOf"] {
                if let Some(group) = map.get(key).and_then(Value::as_array) {
                    for entry in group {
                        collect_enumeration_values(entry, attribute_type, values, seen);
                    }
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                collect_enumeration_values(entry, attribute_type, values, seen);
            }
        }
        _ => {}
    }
}

fn push_enum_value(
    value: &Value,
    label: String,
    values: &mut Vec<ListedValue>,
    seen: &mut HashSet<(&'static str, String)>,
) {
    let marker = (scalar_kind(value), value.to_string());
    if seen.insert(marker) {
        values.push(ListedValue {
            value: value.clone(),
            label,
        });
    }
}

fn is_simple_enum_value(value: &Value) -> bool {
    !value.is_object() && !value.is_array()
}

fn scalar_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn scalar_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn extract_enum_labels(details: &Map<String, Value>, count: usize) -> Option<Vec<String>> {
    const LABEL_KEYS: [&str; 10] = [
        "enumNames",
        "enumTitles",
        "enum_titles",
        "x-enumNames",
        "x-enumTitles",
        "x-enum-names",
        "x-enum-titles",
        "enumDescriptions",
        "x-enumDescriptions",
        "x-enum-descriptions",
    ];

    for key in LABEL_KEYS {
        if let Some(Value::Array(labels)) = details.get(key) {
            let extracted: Vec<String> = labels.iter().take(count).map(scalar_label).collect();
            if !extracted.is_empty() {
                return Some(extracted);
            }
        }
    }
    None
}

fn const_entry_label(details: &Map<String, Value>, value: &Value) -> String {
    for key in ["title", "label", "name", "description"] {
        if let Some(label) = details
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
        {
            return label.to_string();
        }
    }
    scalar_label(value)
}

// --- OGC role extraction --------------------------------------------------

/// Find an `ogcRole`-style annotation on the definition or behind its
/// `$ref`, checking the composition groups as well. The seen set is keyed by
/// (document address, reference) so shared definitions are not revisited.
fn extract_ogc_role(
    details: &Value,
    documents: &[Value],
    current: Option<&Value>,
    seen: &mut HashSet<(usize, String)>,
) -> Option<Value> {
    match details {
        Value::Object(map) => {
            if let Some(role) = role_from_mapping(map) {
                return Some(role);
            }

            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                let mut candidates: Vec<&Value> = Vec::new();
                if let Some(current) = current {
                    candidates.push(current);
                }
                for document in documents {
                    if !current.is_some_and(|current| std::ptr::eq(current, document)) {
                        candidates.push(document);
                    }
                }

                for document in candidates {
                    let marker = (document as *const Value as usize, reference.to_string());
                    if !seen.insert(marker) {
                        continue;
                    }
                    if let Some(resolved) = resolve_json_pointer(document, reference)
                        && resolved.is_object()
                        && let Some(role) =
                            extract_ogc_role(resolved, documents, Some(document), seen)
                    {
                        return Some(role);
                    }
                }
            }

            for key in ["allOf", "anyOf", "oneOf"] {
                if let Some(group) = map.get(key).and_then(Value::as_array) {
                    for entry in group {
                        if let Some(role) = extract_ogc_role(entry, documents, current, seen) {
                            return Some(role);
                        }
                    }
                }
            }

            None
        }
        Value::Array(entries) => entries
            .iter()
            .find_map(|entry| extract_ogc_role(entry, documents, current, seen)),
        _ => None,
    }
}

fn role_from_mapping(map: &Map<String, Value>) -> Option<Value> {
    for (key, value) in map {
        let normalized = key.to_lowercase().replace('_', "-");
        if (normalized.ends_with("ogc-role") || normalized.ends_with("ogc-property-role"))
            && let Some(role) = normalize_role_value(value)
        {
            return Some(role);
        }
    }
    None
}

fn normalize_role_value(value: &Value) -> Option<Value> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Value::Array(entries) => {
            let normalized: Vec<Value> = entries
                .iter()
                .filter_map(|entry| entry.as_str())
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(|text| Value::String(text.to_string()))
                .collect();
            if normalized.is_empty() {
                None
            } else {
                Some(Value::Array(normalized))
            }
        }
        _ => None,
    }
}
