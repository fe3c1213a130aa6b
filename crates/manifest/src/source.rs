use exn::ResultExt;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::Value;
use tracing::instrument;

use crate::directive::PatchDirective;
use crate::error::{ErrorKind, Result};
use crate::metadata::ForeignMetadata;

/// A patch manifest in one of the supported document shapes.
///
/// Each variant has its own reader; all of them produce the same flat,
/// document-ordered directive list.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestSource {
    /// `modding.xml`: `<patch>` elements at any depth.
    Xml(String),
    /// A JSON manifest: a patch object, an array of them, or an object with
    /// a `patches` array. Nested `patches` are walked depth-first.
    Json(Value),
}
impl ManifestSource {
    /// Picks a reader from the manifest's file name.
    pub fn from_file(name: &str, text: &str) -> Result<Self> {
        if name.to_lowercase().ends_with(".json") {
            let value = serde_json::from_str(text).or_raise(|| ErrorKind::MalformedManifest)?;
            return Ok(Self::Json(value));
        }
        Ok(Self::Xml(text.to_string()))
    }

    /// Flattens the manifest into directives, preserving document order.
    #[instrument(level = "debug", skip(self), fields(directives))]
    pub fn directives(&self) -> Result<Vec<PatchDirective>> {
        let directives = match self {
            Self::Xml(text) => read_xml(text)?,
            Self::Json(value) => {
                let mut directives = Vec::new();
                walk_json(value, &mut directives);
                directives
            },
        };
        tracing::Span::current().record("directives", directives.len());
        Ok(directives)
    }
}

fn read_xml(text: &str) -> Result<Vec<PatchDirective>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut directives = Vec::new();
    loop {
        match reader.read_event().or_raise(|| ErrorKind::MalformedManifest)? {
            Event::Start(element) | Event::Empty(element) if element.local_name().as_ref().eq_ignore_ascii_case(b"patch") => {
                directives.push(xml_directive(&element)?);
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(directives)
}

fn xml_directive(element: &BytesStart<'_>) -> Result<PatchDirective> {
    let (mut chapter, mut source, mut target, mut kind) = (None, None, None, None);
    for attribute in element.attributes() {
        let attribute = attribute.or_raise(|| ErrorKind::MalformedManifest)?;
        let value = attribute.unescape_value().or_raise(|| ErrorKind::MalformedManifest)?.into_owned();
        match attribute.key.local_name().as_ref().to_ascii_lowercase().as_slice() {
            b"chapter" => chapter = Some(value),
            b"source" => source = Some(value),
            b"target" => target = Some(value),
            b"type" => kind = Some(value),
            _ => {},
        }
    }
    Ok(PatchDirective::from_attributes(
        chapter.as_deref(),
        source.as_deref(),
        target.as_deref(),
        kind.as_deref(),
    ))
}

fn walk_json(value: &Value, directives: &mut Vec<PatchDirective>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| walk_json(item, directives)),
        Value::Object(object) => {
            if object.contains_key("source") || object.contains_key("target") {
                let field = |name: &str| object.get(name).and_then(json_text);
                directives.push(PatchDirective::from_attributes(
                    field("chapter").as_deref(),
                    field("source").as_deref(),
                    field("target").as_deref(),
                    field("type").as_deref(),
                ));
            }
            for child in ["patches", "patch"] {
                if let Some(child) = object.get(child) {
                    walk_json(child, directives);
                }
            }
        },
        _ => {},
    }
}

// Chapters are sometimes written as bare numbers.
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// A foreign package: its metadata and, when present, its patch manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignManifest {
    pub metadata: ForeignMetadata,
    pub source: Option<ManifestSource>,
}
impl ForeignManifest {
    pub fn new(metadata: ForeignMetadata, source: Option<ManifestSource>) -> Self {
        Self { metadata, source }
    }

    /// Directives of the manifest, or none when the package ships only
    /// metadata.
    pub fn directives(&self) -> Result<Vec<PatchDirective>> {
        match &self.source {
            Some(source) => source.directives(),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::PatchKind;
    use deltahub_model::ChapterKey;
    use serde_json::json;

    #[test]
    fn test_xml_document_order() {
        let source = ManifestSource::Xml(
            r#"<?xml version="1.0"?>
            <modding>
                <patch chapter="1" source="patches/ch1.xdelta" target="chapter1_windows/data.win" type="xdelta"/>
                <group>
                    <Patch source="files/x.png" target="chapter1_windows/sprites/x.png" type="override"></Patch>
                </group>
                <patch source="a &amp; b.png" target="chapter2_windows/a.png"/>
            </modding>"#
                .to_string(),
        );
        let directives = source.directives().unwrap();
        assert_eq!(directives.len(), 3);
        assert_eq!(directives[0].chapter, Some(ChapterKey::new("1")));
        assert_eq!(directives[0].kind, PatchKind::Xdelta);
        assert_eq!(directives[1].source, "files/x.png");
        assert_eq!(directives[1].kind, PatchKind::Override);
        assert_eq!(directives[2].source, "a & b.png");
        assert_eq!(directives[2].kind, PatchKind::Override);
    }

    #[test]
    fn test_xml_root_patch() {
        let source = ManifestSource::Xml(r#"<patch source="p.xdelta" target="data.win"/>"#.to_string());
        let directives = source.directives().unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].kind, PatchKind::Xdelta);
    }

    #[test]
    fn test_xml_malformed() {
        let source = ManifestSource::Xml(r#"<modding><patch source="a"></modding>"#.to_string());
        let err = source.directives().unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedManifest));
    }

    #[test]
    fn test_json_shapes() {
        let single = ManifestSource::Json(json!({"source": "p.xdelta", "target": "chapter1_windows/data.win"}));
        assert_eq!(single.directives().unwrap().len(), 1);

        let nested = ManifestSource::Json(json!({
            "patches": [
                {"chapter": 2, "source": "a.png", "target": "x/a.png", "type": "override"},
                {"patches": [{"source": "b.png", "target": "x/b.png"}]},
                {"source": "c.png", "target": "x/c.png"}
            ]
        }));
        let directives = nested.directives().unwrap();
        let sources: Vec<_> = directives.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(directives[0].chapter, Some(ChapterKey::new("2")));
    }

    #[test]
    fn test_from_file() {
        assert!(matches!(ManifestSource::from_file("modding.json", "[]").unwrap(), ManifestSource::Json(_)));
        assert!(matches!(ManifestSource::from_file("modding.xml", "<a/>").unwrap(), ManifestSource::Xml(_)));
        assert!(ManifestSource::from_file("MODDING.JSON", "{").is_err());
    }

    #[test]
    fn test_metadata_only() {
        let manifest = ForeignManifest::default();
        assert!(manifest.directives().unwrap().is_empty());
    }
}
