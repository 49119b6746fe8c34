//! Geospec SDK - shared library for deriving geospatial product specifications
//!
//! Provides unified interfaces for:
//! - Extracting canonical feature types from OGC API Features services
//! - Extracting canonical feature types from Enterprise Architect XMI exports
//! - Converting Geonorge dataset metadata into a product-metadata mapping
//! - Rendering feature types to Markdown tables and PlantUML class diagrams
//! - Assembling scope-driven feature catalogues

pub mod catalogue;
pub mod export;
pub mod http;
pub mod import;
pub mod models;

// Re-export commonly used types
pub use http::{HttpError, HttpGet, HttpResponse};
#[cfg(feature = "http-client")]
pub use http::client::ReqwestClient;

pub use import::ImportError;
pub use import::geonorge::{build_psdata, fetch_metadata, fetch_psdata};
pub use import::ogc_api::load_feature_types;
pub use import::xmi::{XmiAuth, load_feature_types_from_xmi, parse_feature_types};

pub use export::{ExportError, render_feature_types_to_markdown, render_feature_types_to_puml};

// Re-export models
pub use models::{
    Association, Attribute, FeatureType, Geometry, ListedValue, Relationships, ValueDomain,
};

// Re-export catalogue types
pub use catalogue::{CatalogueArtifacts, Scope, build_catalogue_artifacts, load_scope_feature_types};
