//! Import functionality
//!
//! Provides extractors converting three source formats into the canonical
//! feature-type model:
//! - OGC API Features `/collections` documents (JSON Schema or GML/XSD)
//! - Enterprise Architect XMI/UML feature catalogues
//! - Geonorge dataset metadata records

pub mod geonorge;
pub mod gml_schema;
pub mod ogc_api;
pub mod resolver;
pub mod xmi;
pub mod xml_tree;

/// Error during import
///
/// Structural and network errors abort the extraction for that source;
/// failures on secondary enrichment resources are absorbed internally and
/// never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid document structure: {0}")]
    Structure(String),
    #[error("Request to '{url}' failed{}", format_status(.status))]
    Network { url: String, status: Option<u16> },
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Unknown catalogue generator '{generator}' for scope '{scope}'")]
    UnknownGenerator { scope: String, generator: String },
    #[error("IO error: {0}")]
    Io(String),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status code {code}"),
        None => String::new(),
    }
}

// Re-export for convenience
pub use geonorge::{build_psdata, fetch_metadata, fetch_psdata};
pub use ogc_api::load_feature_types;
pub use xmi::{XmiAuth, load_feature_types_from_xmi, parse_feature_types};
