//! Feature type model for the SDK

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::attribute::Attribute;

/// One real-world entity class, as derived from any of the source formats.
///
/// Serializes directly to the canonical interchange JSON consumed by the
/// renderers; field names are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "abstract", default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FeatureType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            is_abstract: false,
            geometry: None,
            attributes: Vec::new(),
            relationships: None,
        }
    }
}

/// Geometry surfaced on a feature type.
///
/// Geometry-bearing properties are excluded from the attribute tree and only
/// appear here. `geometry_type` is `"Unknown"` when nothing could be derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// Full ordered list when more than one geometry type applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs: Option<Vec<String>>,
    #[serde(rename = "storageCrs", skip_serializing_if = "Option::is_none")]
    pub storage_crs: Option<String>,
    #[serde(rename = "itemType", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(rename = "ogcRole", skip_serializing_if = "Option::is_none")]
    pub ogc_role: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Inheritance and association links of a feature type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Relationships {
    /// Parent type names
    #[serde(default)]
    pub inheritance: Vec<String>,
    #[serde(default)]
    pub associations: Vec<Association>,
}

impl Relationships {
    pub fn is_empty(&self) -> bool {
        self.inheritance.is_empty() && self.associations.is_empty()
    }
}

/// One directed association toward another feature type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Association {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
}
