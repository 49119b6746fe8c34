//! Renderers for canonical feature types
//!
//! Both renderers are pure functions over the canonical model: Markdown for
//! human-readable catalogues, PlantUML for class diagrams. Errors only occur
//! around the renderers (serialization, file output), never inside them.

pub mod markdown;
pub mod plantuml;

use thiserror::Error;

pub use markdown::{MarkdownOptions, render_feature_types_to_markdown};
pub use plantuml::{PumlOptions, render_feature_types_to_puml};

/// Errors from producing or persisting rendered artefacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize feature types: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
