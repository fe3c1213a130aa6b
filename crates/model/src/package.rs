use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{ChapterKey, DEFAULT_VERSION, Game, SlotId, Tag};

/// Where a converted entry came from.
///
/// Only used while resolving bytes during an import session. It is never
/// serialized, so it can not leak into an exported config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    /// Path of the payload inside the source archive, as written by the
    /// foreign manifest.
    pub source_path: String,
    /// Path of the patched file relative to the chapter root.
    pub target_relative_path: String,
}

/// The single main data file (or data patch) of a chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFile {
    pub url: String,
    pub version: String,
    pub provenance: Option<Provenance>,
}
impl DataFile {
    pub fn new(url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            version: version.into(),
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// An additional archive of files installed into a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraFile {
    /// Stable identity within the chapter; the slot id is derived from it.
    pub key: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(skip)]
    pub provenance: Option<Provenance>,
}
impl ExtraFile {
    pub fn new(key: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            version: version.into(),
            provenance: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }
}

/// Payload roles of a single chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChapterFileSetProxy", into = "ChapterFileSetProxy")]
pub struct ChapterFileSet {
    pub data_file: Option<DataFile>,
    pub extra_files: Vec<ExtraFile>,
}
impl ChapterFileSet {
    /// Returns `true` when at least one file role is present.
    pub fn is_populated(&self) -> bool {
        self.data_file.is_some() || !self.extra_files.is_empty()
    }

    pub fn extra(&self, key: &str) -> Option<&ExtraFile> {
        self.extra_files.iter().find(|extra| extra.key == key)
    }

    pub fn extra_mut(&mut self, key: &str) -> Option<&mut ExtraFile> {
        self.extra_files.iter_mut().find(|extra| extra.key == key)
    }
}

// The canonical format flattens the optional data file into two sibling
// fields; an absent `data_file_url` means the chapter has no data file.
#[derive(Clone, Serialize, Deserialize)]
struct ChapterFileSetProxy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_file_version: Option<String>,
    #[serde(default)]
    extra_files: Vec<ExtraFile>,
}
impl From<ChapterFileSetProxy> for ChapterFileSet {
    fn from(proxy: ChapterFileSetProxy) -> Self {
        let data_file = proxy.data_file_url.map(|url| DataFile {
            url,
            version: proxy.data_file_version.unwrap_or_else(default_version),
            provenance: None,
        });
        Self {
            data_file,
            extra_files: proxy.extra_files,
        }
    }
}
impl From<ChapterFileSet> for ChapterFileSetProxy {
    fn from(set: ChapterFileSet) -> Self {
        let (data_file_url, data_file_version) = match set.data_file {
            Some(data) => (Some(data.url), Some(data.version)),
            None => (None, None),
        };
        Self {
            data_file_url,
            data_file_version,
            extra_files: set.extra_files,
        }
    }
}

/// Canonical, serializable description of a mod package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModPackage {
    /// Package identity; derived from the foreign package id or generated
    /// for local mods.
    pub key: Option<String>,
    pub is_local_mod: bool,
    pub created_date: Option<String>,
    pub is_available_on_server: bool,
    pub name: String,
    pub author: String,
    pub tagline: String,
    pub version: String,
    pub external_url: String,
    pub icon_url: String,
    pub description_url: String,
    pub game_version: String,
    #[serde(alias = "modgame")]
    pub game: Game,
    #[serde(deserialize_with = "Tag::lenient")]
    pub tags: BTreeSet<Tag>,
    pub screenshots_url: Vec<String>,
    pub files: BTreeMap<ChapterKey, ChapterFileSet>,
}
impl Default for ModPackage {
    fn default() -> Self {
        Self {
            key: None,
            is_local_mod: false,
            created_date: None,
            is_available_on_server: false,
            name: String::new(),
            author: String::new(),
            tagline: String::new(),
            version: default_version(),
            external_url: String::new(),
            icon_url: String::new(),
            description_url: String::new(),
            game_version: String::new(),
            game: Game::default(),
            tags: BTreeSet::new(),
            screenshots_url: Vec::new(),
            files: BTreeMap::new(),
        }
    }
}
impl ModPackage {
    pub fn new(name: impl Into<String>, game: Game) -> Self {
        Self {
            name: name.into(),
            game,
            ..Self::default()
        }
    }

    pub fn chapter(&self, chapter: &ChapterKey) -> Option<&ChapterFileSet> {
        self.files.get(chapter)
    }

    /// Chapters that have at least one file role populated.
    pub fn populated_chapters(&self) -> impl Iterator<Item = (&ChapterKey, &ChapterFileSet)> {
        self.files.iter().filter(|(_, set)| set.is_populated())
    }

    /// A package must populate at least one chapter before it can be
    /// exported.
    pub fn is_exportable(&self) -> bool {
        self.populated_chapters().next().is_some()
    }

    /// Every file slot this package declares, in chapter order.
    pub fn slots(&self) -> Vec<SlotId> {
        let mut slots = Vec::new();
        for (chapter, set) in &self.files {
            if set.data_file.is_some() {
                slots.push(SlotId::data_file(chapter.clone()));
            }
            slots.extend(set.extra_files.iter().map(|extra| SlotId::extra(chapter.clone(), extra.key.clone())));
        }
        slots
    }

    /// Returns a copy with every internal provenance record removed.
    pub fn stripped(&self) -> Self {
        let mut package = self.clone();
        for set in package.files.values_mut() {
            if let Some(data) = set.data_file.as_mut() {
                data.provenance = None;
            }
            for extra in &mut set.extra_files {
                extra.provenance = None;
            }
        }
        package
    }

    pub fn has_provenance(&self) -> bool {
        self.files.values().any(|set| {
            set.data_file.as_ref().is_some_and(|data| data.provenance.is_some())
                || set.extra_files.iter().any(|extra| extra.provenance.is_some())
        })
    }
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModPackage {
        let mut package = ModPackage::new("Sample", Game::Deltarune);
        package.files.insert(
            ChapterKey::new("1"),
            ChapterFileSet {
                data_file: Some(DataFile::new("chapter1.xdelta", "1.2.0").with_provenance(Provenance {
                    source_path: "patches/chapter1.xdelta".into(),
                    target_relative_path: "data.win".into(),
                })),
                extra_files: vec![ExtraFile::new("music", "music.zip", "1.0.0")],
            },
        );
        package
    }

    #[test]
    fn test_chapter_wire_format() {
        let set = sample().files.remove(&ChapterKey::new("1")).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data_file_url": "chapter1.xdelta",
                "data_file_version": "1.2.0",
                "extra_files": [{"key": "music", "url": "music.zip", "version": "1.0.0"}]
            })
        );
    }

    #[test]
    fn test_chapter_without_data_file() {
        let set: ChapterFileSet = serde_json::from_str(r#"{"extra_files": []}"#).unwrap();
        assert!(set.data_file.is_none());
        assert!(!set.is_populated());
        let set: ChapterFileSet = serde_json::from_str(r#"{"data_file_url": ""}"#).unwrap();
        assert_eq!(set.data_file, Some(DataFile::new("", "1.0.0")));
    }

    #[test]
    fn test_provenance_never_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("provenance"));
        assert!(!json.contains("patches/chapter1.xdelta"));
    }

    #[test]
    fn test_stripped() {
        let package = sample();
        assert!(package.has_provenance());
        let stripped = package.stripped();
        assert!(!stripped.has_provenance());
        assert_eq!(stripped.name, package.name);
    }

    #[test]
    fn test_legacy_and_lenient_fields() {
        let package: ModPackage =
            serde_json::from_str(r#"{"name": "x", "modgame": "undertale", "tags": ["gameplay", "bogus"]}"#).unwrap();
        assert_eq!(package.game, Game::Undertale);
        assert_eq!(package.tags, BTreeSet::from([Tag::Gameplay]));
        assert_eq!(package.version, "1.0.0");
    }

    #[test]
    fn test_slots_and_exportable() {
        let package = sample();
        assert!(package.is_exportable());
        assert_eq!(package.slots(), vec![SlotId::data_file("1"), SlotId::extra("1", "music")]);
        let mut empty = ModPackage::new("Empty", Game::Deltarune);
        empty.files.insert(ChapterKey::new("2"), ChapterFileSet::default());
        assert!(!empty.is_exportable());
    }
}
