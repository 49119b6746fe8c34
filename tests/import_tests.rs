//! End-to-end pipeline tests through the public API

use std::collections::HashMap;

use serde_json::json;

use geospec_sdk::export::{
    MarkdownOptions, PumlOptions, render_feature_types_to_markdown, render_feature_types_to_puml,
};
use geospec_sdk::http::{HttpError, HttpGet, HttpResponse};
use geospec_sdk::{
    FeatureType, ImportError, Scope, XmiAuth, build_catalogue_artifacts, build_psdata,
    load_scope_feature_types, parse_feature_types,
};

struct FakeGetter {
    responses: HashMap<String, HttpResponse>,
}

impl FakeGetter {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    fn insert(&mut self, url: &str, response: HttpResponse) {
        self.responses.insert(url.to_string(), response);
    }
}

impl HttpGet for FakeGetter {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| HttpError::Request(format!("unexpected url: {url}")))
    }
}

fn ogc_getter() -> FakeGetter {
    let mut getter = FakeGetter::new();
    getter.insert(
        "https://api.test/collections",
        HttpResponse::from_json(json!({
            "collections": [{
                "id": "bygning",
                "description": "Bygninger i kommunen",
                "crs": ["http://www.opengis.net/def/crs/OGC/1.3/CRS84"],
                "storageCrs": "http://www.opengis.net/def/crs/EPSG/0/25833",
                "links": [
                    {"rel": "http://www.opengis.net/def/rel/ogc/1.0/schema",
                     "href": "https://api.test/collections/bygning/schema"}
                ]
            }]
        })),
    );
    getter.insert(
        "https://api.test/collections/bygning/schema",
        HttpResponse::from_json(json!({
            "title": "Bygning",
            "required": ["bygningsnummer"],
            "properties": {
                "bygningsnummer": {"type": "integer", "description": "Unikt nummer"},
                "status": {
                    "type": "string",
                    "enum": ["planlagt", "eksisterende"]
                },
                "geometry": {"format": "geometry-polygon", "geometryType": "Polygon",
                             "x-ogc-role": "primary-geometry"}
            }
        })),
    );
    getter
}

const XMI_CATALOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<XMI xmi.version="1.1" xmlns:UML="omg.org/UML1.3">
  <XMI.content>
    <UML:Model name="Testmodell">
      <UML:Class xmi.id="c1" name="Bygning">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="FeatureType"/>
        </UML:ModelElement.stereotype>
        <UML:ModelElement.taggedValue>
          <UML:TaggedValue tag="documentation" value="Bygning fra matrikkelen."/>
        </UML:ModelElement.taggedValue>
        <UML:Classifier.feature>
          <UML:Attribute name="bygningsnummer">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="Integer"/>
            </UML:ModelElement.taggedValue>
            <UML:StructuralFeature.multiplicity>
              <UML:Multiplicity>
                <UML:Multiplicity.range>
                  <UML:MultiplicityRange lower="1" upper="1"/>
                </UML:Multiplicity.range>
              </UML:Multiplicity>
            </UML:StructuralFeature.multiplicity>
          </UML:Attribute>
          <UML:Attribute name="grense">
            <UML:ModelElement.taggedValue>
              <UML:TaggedValue tag="type" value="GM_Surface"/>
            </UML:ModelElement.taggedValue>
          </UML:Attribute>
        </UML:Classifier.feature>
      </UML:Class>
      <UML:Class xmi.id="c2" name="AbstraktByggverk" isAbstract="true">
        <UML:ModelElement.stereotype>
          <UML:Stereotype name="FeatureType"/>
        </UML:ModelElement.stereotype>
      </UML:Class>
      <UML:Generalization xmi.id="g1" subtype="c1" supertype="c2"/>
    </UML:Model>
  </XMI.content>
</XMI>"#;

mod ogc_pipeline_tests {
    use super::*;

    #[test]
    fn test_scope_dispatch_to_ogc_extractor() {
        let scope = Scope {
            name: "Innsynstjeneste".to_string(),
            url: "https://api.test/collections".to_string(),
            generator: "ogc_feature_api".to_string(),
            description: String::new(),
        };

        let feature_types =
            load_scope_feature_types(&scope, &XmiAuth::default(), &ogc_getter()).unwrap();
        assert_eq!(feature_types.len(), 1);

        let bygning = &feature_types[0];
        assert_eq!(bygning.name, "Bygning");
        assert_eq!(bygning.description, "Bygninger i kommunen");
        assert_eq!(bygning.attributes.len(), 2);
        assert_eq!(bygning.attributes[0].cardinality, "1");
        assert_eq!(bygning.attributes[1].cardinality, "0..1");

        let geometry = bygning.geometry.as_ref().unwrap();
        assert_eq!(geometry.geometry_type, "Polygon");
        assert_eq!(
            geometry.storage_crs.as_deref(),
            Some("http://www.opengis.net/def/crs/EPSG/0/25833")
        );
    }

    #[test]
    fn test_unknown_generator_is_a_validation_error() {
        let scope = Scope {
            name: "Feil".to_string(),
            url: "https://api.test/collections".to_string(),
            generator: "wfs".to_string(),
            description: String::new(),
        };

        let error =
            load_scope_feature_types(&scope, &XmiAuth::default(), &ogc_getter()).unwrap_err();
        assert!(matches!(error, ImportError::UnknownGenerator { .. }));
    }

    #[test]
    fn test_catalogue_artifacts_from_ogc_scope() {
        let scope = Scope {
            name: "Bygg og anlegg".to_string(),
            url: "https://api.test/collections".to_string(),
            generator: "ogc_feature_api".to_string(),
            description: String::new(),
        };

        let feature_types =
            load_scope_feature_types(&scope, &XmiAuth::default(), &ogc_getter()).unwrap();
        let artifacts = build_catalogue_artifacts(&scope, &feature_types).unwrap();

        assert_eq!(artifacts.slug, "bygg-og-anlegg");
        assert!(artifacts.markdown.contains("#### Bygning"));
        assert!(artifacts.markdown.contains("<strong>geometry</strong>"));
        assert!(artifacts.plantuml.contains("class Bygning <<featureType>> {"));

        // The JSON artefact is the canonical interchange format.
        let parsed: Vec<FeatureType> = serde_json::from_str(&artifacts.json).unwrap();
        assert_eq!(parsed, feature_types);
    }
}

mod xmi_pipeline_tests {
    use super::*;

    #[test]
    fn test_parse_and_render_xmi_catalogue() {
        let feature_types = parse_feature_types(XMI_CATALOGUE).unwrap();
        assert_eq!(feature_types.len(), 2);

        let bygning = &feature_types[0];
        assert_eq!(bygning.name, "Bygning");
        let geometry = bygning.geometry.as_ref().unwrap();
        assert_eq!(geometry.name.as_deref(), Some("grense"));
        assert_eq!(geometry.geometry_type, "GM_Surface");

        let relationships = bygning.relationships.as_ref().unwrap();
        assert_eq!(relationships.inheritance, vec!["AbstraktByggverk".to_string()]);

        let markdown =
            render_feature_types_to_markdown(&feature_types, &MarkdownOptions::default());
        assert!(markdown.contains("#### Bygning"));
        assert!(markdown.contains("#### AbstraktByggverk (abstrakt)"));
        assert!(markdown.contains("**Arv**\nAbstraktByggverk"));

        let puml = render_feature_types_to_puml(&feature_types, &PumlOptions::default());
        assert!(puml.contains("abstract class AbstraktByggverk <<featureType>> {"));
        assert!(puml.contains("AbstraktByggverk <|-- Bygning"));
        assert!(puml.contains("+ grense [1] : GM_Surface"));
    }

    #[test]
    fn test_canonical_json_field_names() {
        let feature_types = parse_feature_types(XMI_CATALOGUE).unwrap();
        let value = serde_json::to_value(&feature_types).unwrap();

        assert_eq!(value[0]["name"], "Bygning");
        assert_eq!(value[0]["geometry"]["type"], "GM_Surface");
        assert_eq!(value[0]["geometry"]["ogcRole"], "primary-geometry");
        assert_eq!(value[0]["attributes"][0]["type"], "Integer");
        assert_eq!(value[0]["attributes"][0]["cardinality"], "1");
        assert_eq!(value[1]["abstract"], true);
        assert_eq!(value[0]["relationships"]["inheritance"][0], "AbstraktByggverk");
    }
}

mod geonorge_pipeline_tests {
    use super::*;

    #[test]
    fn test_build_psdata_compacts_record() {
        let metadata = json!({
            "Uuid": "abc-123",
            "Title": "Matrikkelen - Bygninger",
            "Abstract": "",
            "HierarchyLevel": "dataset",
            "DatePublished": "2020-05-04T12:00:00Z",
            "KeywordsTheme": [{"KeywordValue": "Bygninger"}],
            "ReferenceSystem": {
                "CoordinateSystemUrl": "http://www.opengis.net/def/crs/EPSG/0/25833",
                "CoordinateSystem": "ETRS89 / UTM 33N"
            }
        });

        let psdata = build_psdata("abc-123", &metadata);

        assert_eq!(psdata["identification"]["id"], "abc-123");
        assert_eq!(psdata["identification"]["title"], "Matrikkelen - Bygninger");
        assert!(psdata["identification"].get("abstract").is_none());
        assert_eq!(psdata["identification"]["keywords"][0], "Bygninger");
        assert_eq!(psdata["identification"]["dates"]["publication"], "2020-05-04");
        assert_eq!(
            psdata["referenceSystems"]["spatialReferenceSystems"][0]["code"],
            "EPSG:25833"
        );
        assert_eq!(psdata["scope"]["level"], "dataset");
    }
}
