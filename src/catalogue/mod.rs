//! Scope-driven feature catalogue assembly
//!
//! A product specification can carry several catalogue scopes (e.g. one data
//! capture model and one view service). Each scope names its source and the
//! generator to run against it; the driver turns the extracted feature types
//! into the artefact set persisted per scope: canonical JSON, a Markdown
//! table and a PlantUML diagram, filed under an ASCII slug.

use serde::{Deserialize, Serialize};

use crate::export::{
    ExportError, MarkdownOptions, PumlOptions, render_feature_types_to_markdown,
    render_feature_types_to_puml,
};
use crate::http::HttpGet;
use crate::import::{ImportError, XmiAuth, load_feature_types, load_feature_types_from_xmi};
use crate::models::FeatureType;

/// One catalogue source of a product specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scope {
    pub name: String,
    pub url: String,
    /// Extractor to run: `ogc_feature_api` or `xmi`
    pub generator: String,
    #[serde(default)]
    pub description: String,
}

/// Rendered artefacts of one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueArtifacts {
    /// Directory/file slug derived from the scope name
    pub slug: String,
    /// Canonical feature types as pretty-printed JSON
    pub json: String,
    pub markdown: String,
    pub plantuml: String,
}

/// Extract the feature types a scope points at.
///
/// The generator name is validated before anything is fetched, so a
/// misconfigured scope never triggers network traffic.
pub fn load_scope_feature_types(
    scope: &Scope,
    auth: &XmiAuth,
    getter: &dyn HttpGet,
) -> Result<Vec<FeatureType>, ImportError> {
    match scope.generator.as_str() {
        "ogc_feature_api" => load_feature_types(&scope.url, getter),
        "xmi" => load_feature_types_from_xmi(&scope.url, auth, getter),
        _ => Err(ImportError::UnknownGenerator {
            scope: scope.name.clone(),
            generator: scope.generator.clone(),
        }),
    }
}

/// Render the artefact set for one scope's feature types.
///
/// The diagram follows the catalogue pages: notes and attribute descriptions
/// are left to the Markdown table, the diagram stays compact.
pub fn build_catalogue_artifacts(
    scope: &Scope,
    feature_types: &[FeatureType],
) -> Result<CatalogueArtifacts, ExportError> {
    let json = serde_json::to_string_pretty(feature_types)?;

    let markdown = render_feature_types_to_markdown(feature_types, &MarkdownOptions::default());

    let title = scope.name.trim();
    let puml_options = PumlOptions {
        title: (!title.is_empty()).then(|| format!("{title} - Objekttyper")),
        package: Some("Objekttyper".to_string()),
        include_notes: false,
        include_descriptions: false,
    };
    let plantuml = render_feature_types_to_puml(feature_types, &puml_options);

    let mut slug = normalize_slug(&scope.name);
    if slug.is_empty() {
        slug = "objektkatalog".to_string();
    }

    Ok(CatalogueArtifacts {
        slug,
        json,
        markdown,
        plantuml,
    })
}

/// Lowercase ASCII slug: Nordic and accented letters transliterated, runs of
/// anything else collapsed to a single `-`.
pub fn normalize_slug(text: &str) -> String {
    let mut ascii = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match c {
            'å' | 'ä' | 'á' | 'à' | 'â' => ascii.push('a'),
            'ø' | 'ö' | 'ó' | 'ò' | 'ô' => ascii.push('o'),
            'æ' => ascii.push_str("ae"),
            'é' | 'è' | 'ê' | 'ë' => ascii.push('e'),
            'ü' | 'ú' | 'ù' => ascii.push('u'),
            'í' | 'ì' | 'ï' => ascii.push('i'),
            c if c.is_ascii() => ascii.push(c),
            _ => {}
        }
    }

    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, HttpResponse};

    struct NoFetch;

    impl HttpGet for NoFetch {
        fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            panic!("unexpected request to {url}");
        }
    }

    fn scope(generator: &str) -> Scope {
        Scope {
            name: "Datafangst Bygg og anlegg".to_string(),
            url: "https://example.invalid/source".to_string(),
            generator: generator.to_string(),
            description: "Datamodell for datafangst.".to_string(),
        }
    }

    #[test]
    fn test_unknown_generator_fails_before_any_fetch() {
        let error = load_scope_feature_types(&scope("wfs"), &XmiAuth::default(), &NoFetch)
            .unwrap_err();
        match error {
            ImportError::UnknownGenerator { scope, generator } => {
                assert_eq!(scope, "Datafangst Bygg og anlegg");
                assert_eq!(generator, "wfs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("Datafangst Bygg og anlegg"), "datafangst-bygg-og-anlegg");
        assert_eq!(normalize_slug("Grønnstruktur – Østfold"), "gronnstruktur-ostfold");
        assert_eq!(normalize_slug("Vær & føre"), "vaer-fore");
        assert_eq!(normalize_slug("---"), "");
    }

    #[test]
    fn test_artifacts_carry_all_renderings() {
        let mut feature = FeatureType::new("Bygning");
        feature.attributes.push(crate::models::Attribute::new("status", "string"));

        let artifacts = build_catalogue_artifacts(&scope("xmi"), &[feature]).unwrap();

        assert_eq!(artifacts.slug, "datafangst-bygg-og-anlegg");
        assert!(artifacts.json.contains("\"name\": \"Bygning\""));
        assert!(artifacts.markdown.contains("#### Bygning"));
        assert!(artifacts.plantuml.contains("title Datafangst Bygg og anlegg - Objekttyper"));
        assert!(artifacts.plantuml.contains("package \"Objekttyper\" {"));
        assert!(artifacts.plantuml.contains("class Bygning <<featureType>> {"));
    }
}
