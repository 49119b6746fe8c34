//! Attribute model for the SDK

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, typed property of a feature type, potentially a subtree.
///
/// Dotted path segments are used internally while the extractors build the
/// tree; the rendered `name` is always the leaf segment relative to its
/// parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    /// Attribute name (leaf path segment)
    pub name: String,
    /// Type tag: a primitive name, a format-qualified name (`"date-time"`,
    /// `"gml"`), or `"object"` for a node with children
    #[serde(rename = "type")]
    pub attribute_type: String,
    /// Multiplicity as `min..max` (`*` for unbounded), collapsed when equal
    #[serde(default)]
    pub cardinality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Domain-specific role flag (e.g. `primary-geometry`) carried through
    /// from schema/annotation extensions
    #[serde(rename = "ogcRole", skip_serializing_if = "Option::is_none")]
    pub ogc_role: Option<Value>,
    #[serde(rename = "valueDomain", skip_serializing_if = "Option::is_none")]
    pub value_domain: Option<ValueDomain>,
    /// Children, when the attribute resolves to a structured type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: attribute_type.into(),
            cardinality: String::new(),
            description: None,
            ogc_role: None,
            value_domain: None,
            attributes: Vec::new(),
        }
    }
}

/// Enumerated value domain attached to an attribute.
///
/// `enumeration` is the sole kind currently modelled; codelist passthrough
/// fields are optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValueDomain {
    #[serde(rename = "type")]
    pub domain_type: String,
    #[serde(rename = "listedValues", default, skip_serializing_if = "Vec::is_empty")]
    pub listed_values: Vec<ListedValue>,
    #[serde(rename = "codeList", skip_serializing_if = "Option::is_none")]
    pub code_list: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(rename = "asDictionary", skip_serializing_if = "Option::is_none")]
    pub as_dictionary: Option<String>,
}

impl ValueDomain {
    pub fn enumeration(listed_values: Vec<ListedValue>) -> Self {
        Self {
            domain_type: "enumeration".to_string(),
            listed_values,
            code_list: None,
            definition: None,
            as_dictionary: None,
        }
    }
}

/// One listed value of an enumerated domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListedValue {
    /// Primitive JSON scalar
    pub value: Value,
    pub label: String,
}

impl ListedValue {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}
