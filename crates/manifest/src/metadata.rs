use exn::ResultExt;
use serde::Deserialize;

use crate::error::{ErrorKind, Result};

/// Package identifier used by the foreign tool when the author never set
/// one.
pub(crate) const UNKNOWN_PACKAGE_ID: &str = "und.und.und";

/// Metadata record of a foreign package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignMetadata {
    pub package_id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub demo: bool,
    pub target_game_version: Option<String>,
    pub tags: Vec<String>,
}
impl ForeignMetadata {
    /// Parses a foreign metadata document.
    ///
    /// Blank input is an absent document and yields empty metadata. The
    /// fields are normally nested under `metadata`; documents that put them
    /// at the top level are accepted too.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let document: MetadataDocument = serde_json::from_str(text).or_raise(|| ErrorKind::MalformedMetadata)?;
        Ok(document.into())
    }

    /// The package id, unless it is missing, blank or the foreign tool's
    /// placeholder.
    pub fn known_package_id(&self) -> Option<&str> {
        self.package_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != UNKNOWN_PACKAGE_ID)
    }

    /// Authors joined with `", "`, or `None` when there are none.
    pub fn author(&self) -> Option<String> {
        match self.authors.is_empty() {
            true => None,
            false => Some(self.authors.join(", ")),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataDocument {
    metadata: Option<MetadataFields>,
    #[serde(flatten)]
    top_level: MetadataFields,
    deltarune_target_version: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MetadataFields {
    #[serde(rename = "packageID", alias = "packageId")]
    package_id: Option<String>,
    name: Option<String>,
    version: Option<String>,
    author: Option<Authors>,
    description: Option<String>,
    url: Option<String>,
    demo_mod: Option<bool>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Authors {
    One(String),
    Many(Vec<String>),
}
impl From<Authors> for Vec<String> {
    fn from(authors: Authors) -> Self {
        match authors {
            Authors::One(author) => vec![author],
            Authors::Many(authors) => authors,
        }
    }
}

impl From<MetadataDocument> for ForeignMetadata {
    fn from(document: MetadataDocument) -> Self {
        let fields = document.metadata.unwrap_or(document.top_level);
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            package_id: non_blank(fields.package_id),
            name: non_blank(fields.name),
            version: non_blank(fields.version),
            authors: fields
                .author
                .map(Vec::from)
                .unwrap_or_default()
                .into_iter()
                .filter(|author| !author.trim().is_empty())
                .collect(),
            description: non_blank(fields.description),
            url: non_blank(fields.url),
            demo: fields.demo_mod.unwrap_or(false),
            target_game_version: non_blank(document.deltarune_target_version),
            tags: fields.tags.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_nested() {
        let metadata = ForeignMetadata::parse(
            r#"{
                "metadata": {
                    "packageID": "com.example.mod",
                    "name": "Example",
                    "version": "2.1.0",
                    "author": ["Alice", "Bob"],
                    "description": "A mod",
                    "url": "https://example.com",
                    "demoMod": true,
                    "tags": ["gameplay", "weird"]
                },
                "deltaruneTargetVersion": "1.04"
            }"#,
        )
        .unwrap();
        assert_eq!(metadata.known_package_id(), Some("com.example.mod"));
        assert_eq!(metadata.name.as_deref(), Some("Example"));
        assert_eq!(metadata.version.as_deref(), Some("2.1.0"));
        assert_eq!(metadata.author().as_deref(), Some("Alice, Bob"));
        assert!(metadata.demo);
        assert_eq!(metadata.target_game_version.as_deref(), Some("1.04"));
        assert_eq!(metadata.tags, vec!["gameplay", "weird"]);
    }

    #[test]
    fn test_parse_top_level() {
        let metadata = ForeignMetadata::parse(r#"{"name": "Flat", "author": "Carol"}"#).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Flat"));
        assert_eq!(metadata.author().as_deref(), Some("Carol"));
        assert!(!metadata.demo);
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    #[case("{}")]
    fn test_parse_empty(#[case] text: &str) {
        assert_eq!(ForeignMetadata::parse(text).unwrap(), ForeignMetadata::default());
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2]")]
    #[case(r#"{"metadata": {"demoMod": "yes"}}"#)]
    fn test_parse_malformed(#[case] text: &str) {
        let err = ForeignMetadata::parse(text).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedMetadata));
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("und.und.und"), None)]
    #[case(Some("  "), None)]
    #[case(Some("a.b.c"), Some("a.b.c"))]
    fn test_known_package_id(#[case] id: Option<&str>, #[case] expected: Option<&str>) {
        let metadata = ForeignMetadata {
            package_id: id.map(String::from),
            ..Default::default()
        };
        assert_eq!(metadata.known_package_id(), expected);
    }
}
