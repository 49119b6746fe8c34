//! Generic JSON-Pointer / `$ref` resolution
//!
//! Resolves schema references against the document they appeared in plus an
//! ordered list of fallback documents, including lookup by bare definition
//! name inside `$defs`, `definitions` and `components.schemas` containers.
//! Callers must tolerate an unresolved reference by treating the attribute
//! as opaque rather than failing.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Resolve a `#/...` JSON Pointer against a single document.
///
/// Only fragment pointers are supported; `#` alone returns the document
/// itself. Array segments must be valid indices.
pub fn resolve_json_pointer<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    if !pointer.starts_with('#') {
        return None;
    }
    if pointer == "#" {
        return Some(document);
    }
    if !pointer.starts_with("#/") {
        return None;
    }

    let mut current = document;
    for raw_part in pointer[2..].split('/') {
        let part = raw_part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&part)?,
            Value::Array(items) => {
                let index: usize = part.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }

    Some(current)
}

/// Look a definition up by bare name in the well-known schema containers.
fn find_definition_by_name<'a>(document: &'a Value, name: &str) -> Option<&'a Value> {
    let mut containers: Vec<&Map<String, Value>> = Vec::new();
    for key in ["$defs", "definitions"] {
        if let Some(container) = document.get(key).and_then(Value::as_object) {
            containers.push(container);
        }
    }
    if let Some(schemas) = document
        .get("components")
        .and_then(|components| components.get("schemas"))
        .and_then(Value::as_object)
    {
        containers.push(schemas);
    }

    containers
        .into_iter()
        .find_map(|container| container.get(name))
}

/// Resolve a `$ref` string against the originating document and the ordered
/// fallback documents, returning the resolved mapping or `None`.
pub fn resolve_schema_reference(
    reference: &str,
    source: Option<&Value>,
    documents: &[Value],
) -> Option<Value> {
    if reference.is_empty() {
        return None;
    }

    let mut pointer: Option<String> = None;
    if reference.starts_with('#') {
        pointer = Some(reference.to_string());
        if let Some(document) = source
            && let Some(resolved) = resolve_json_pointer(document, reference)
        {
            return Some(resolved.clone());
        }
    } else if let Some(hash_index) = reference.find('#') {
        pointer = Some(format!("#{}", &reference[hash_index + 1..]));
    }

    let mut candidates: Vec<&Value> = Vec::new();
    if let Some(document) = source {
        candidates.push(document);
    }
    for document in documents {
        if document.is_object() && !candidates.iter().any(|seen| std::ptr::eq(*seen, document)) {
            candidates.push(document);
        }
    }

    if let Some(pointer) = pointer.as_deref() {
        for document in &candidates {
            if let Some(resolved) = resolve_json_pointer(document, pointer) {
                return Some(resolved.clone());
            }
        }
    }

    // Fallback: look the trailing segment up as a bare definition name.
    let definition_name = match pointer.as_deref() {
        Some(pointer) => {
            let stripped = pointer.trim_start_matches('#').trim_start_matches('/');
            stripped.split('/').filter(|part| !part.is_empty()).last()
        }
        None => {
            let tail = reference.split('#').next_back().unwrap_or(reference);
            tail.rsplit('/').next()
        }
    };

    if let Some(name) = definition_name.filter(|name| !name.is_empty()) {
        for document in &candidates {
            if let Some(resolved) = find_definition_by_name(document, name) {
                return Some(resolved.clone());
            }
        }
    }

    None
}

/// Resolve the `$ref` inside `details`, shallow-merging sibling keys over the
/// resolved mapping (override wins). Cyclic references return the original
/// details untouched.
pub fn resolve_attribute_details(
    details: &Value,
    source: Option<&Value>,
    documents: &[Value],
    ref_stack: &mut HashSet<String>,
) -> Value {
    let Some(map) = details.as_object() else {
        return details.clone();
    };

    let reference = map.get("$ref").and_then(Value::as_str).unwrap_or("");
    if reference.is_empty() || ref_stack.contains(reference) {
        return details.clone();
    }

    ref_stack.insert(reference.to_string());
    let resolved = resolve_schema_reference(reference, source, documents);
    let result = match resolved {
        Some(Value::Object(resolved_map)) => {
            let mut merged = resolved_map;
            for (key, value) in map {
                if key != "$ref" {
                    merged.insert(key.clone(), value.clone());
                }
            }
            resolve_attribute_details(&Value::Object(merged), source, documents, ref_stack)
        }
        _ => details.clone(),
    };
    ref_stack.remove(reference);

    result
}

/// Derive an attribute's type tag, following `$ref` chains with cycle
/// protection. Unresolvable shapes yield `"unknown"`.
pub fn parse_attribute_type(
    details: &Value,
    source: Option<&Value>,
    documents: &[Value],
    ref_stack: &mut HashSet<String>,
) -> String {
    let Some(map) = details.as_object() else {
        return match details {
            Value::Null => "unknown".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "str".to_string(),
            Value::Array(_) => "list".to_string(),
            Value::Object(_) => unreachable!(),
        };
    };

    if let Some(reference) = map.get("$ref").and_then(Value::as_str).filter(|r| !r.is_empty()) {
        if ref_stack.contains(reference) {
            return "unknown".to_string();
        }
        ref_stack.insert(reference.to_string());
        let resolved = resolve_schema_reference(reference, source, documents);
        let result = match resolved {
            Some(Value::Object(resolved_map)) => {
                let mut merged = resolved_map;
                for (key, value) in map {
                    if key != "$ref" {
                        merged.insert(key.clone(), value.clone());
                    }
                }
                Some(parse_attribute_type(
                    &Value::Object(merged),
                    source,
                    documents,
                    ref_stack,
                ))
            }
            _ => None,
        };
        ref_stack.remove(reference);
        if let Some(result) = result {
            return result;
        }
    }

    if let Some(format) = map.get("format").and_then(Value::as_str).filter(|f| !f.is_empty()) {
        if let Some(type_value) = map.get("type").and_then(Value::as_str).filter(|t| !t.is_empty())
            && !format.eq_ignore_ascii_case(type_value)
        {
            return format!("{} ({})", format, type_value);
        }
        return format.to_string();
    }

    let type_value = map.get("type").or_else(|| map.get("dataType"));
    match type_value {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(text) if !text.is_empty() => Some(text.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(" | ");
            if joined.is_empty() {
                "unknown".to_string()
            } else {
                joined
            }
        }
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_json_pointer() {
        let document = json!({"a": {"b": [{"c": 1}]}});
        assert_eq!(
            resolve_json_pointer(&document, "#/a/b/0/c"),
            Some(&json!(1))
        );
        assert_eq!(resolve_json_pointer(&document, "#"), Some(&document));
        assert!(resolve_json_pointer(&document, "#/a/missing").is_none());
        assert!(resolve_json_pointer(&document, "/a/b").is_none());
    }

    #[test]
    fn test_resolve_reference_by_definition_name() {
        let schema = json!({
            "$defs": {"Status": {"type": "string", "enum": ["A", "B"]}}
        });
        let resolved = resolve_schema_reference(
            "https://example.com/other.json#/$defs/Status",
            None,
            std::slice::from_ref(&schema),
        );
        assert_eq!(resolved.unwrap()["type"], "string");
    }

    #[test]
    fn test_sibling_keys_override_resolved_keys() {
        let schema = json!({
            "$defs": {"Base": {"type": "string", "title": "Base title"}}
        });
        let details = json!({"$ref": "#/$defs/Base", "title": "Override"});
        let mut stack = HashSet::new();
        let resolved = resolve_attribute_details(
            &details,
            Some(&schema),
            std::slice::from_ref(&schema),
            &mut stack,
        );
        assert_eq!(resolved["type"], "string");
        assert_eq!(resolved["title"], "Override");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_reference_cycle_yields_unknown_type() {
        let schema = json!({
            "$defs": {
                "A": {"$ref": "#/$defs/B"},
                "B": {"$ref": "#/$defs/A"}
            }
        });
        let details = json!({"$ref": "#/$defs/A"});
        let mut stack = HashSet::new();
        let parsed = parse_attribute_type(
            &details,
            Some(&schema),
            std::slice::from_ref(&schema),
            &mut stack,
        );
        assert_eq!(parsed, "unknown");
    }

    #[test]
    fn test_format_combined_with_type() {
        let details = json!({"type": "string", "format": "date-time"});
        let mut stack = HashSet::new();
        assert_eq!(
            parse_attribute_type(&details, None, &[], &mut stack),
            "date-time (string)"
        );
    }

    #[test]
    fn test_type_list_joined() {
        let details = json!({"type": ["string", "null"]});
        let mut stack = HashSet::new();
        assert_eq!(
            parse_attribute_type(&details, None, &[], &mut stack),
            "string | null"
        );
    }
}
