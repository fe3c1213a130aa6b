//! File Mapping Builder.
//!
//! Reconstructs which archive entry backs each slot of a package. Exact
//! candidates come first; a basename scan over the whole archive is the
//! explicit last resort and its hits are reported as
//! [`MatchKind::Heuristic`].

use std::collections::BTreeMap;

use deltahub_archive::ArchiveEntry;
use deltahub_model::paths::{basename, normalize};
use deltahub_model::{ICON_FILE_NAME, ModPackage, Provenance, SlotId};
use tracing::{debug, instrument};

/// How a slot's archive entry was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// One of the candidate paths named the entry directly.
    Exact,
    /// Only a file with the same name somewhere in the archive matched.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMatch {
    pub path: String,
    pub kind: MatchKind,
}

/// Slot to archive path table. Unresolved slots are absent.
pub type FileMapping = BTreeMap<SlotId, SlotMatch>;

pub struct MappingBuilder<'a> {
    entries: &'a BTreeMap<String, ArchiveEntry>,
    root: &'a str,
}
impl<'a> MappingBuilder<'a> {
    pub fn new(entries: &'a BTreeMap<String, ArchiveEntry>) -> Self {
        Self { entries, root: "" }
    }

    /// Directory prefix (with trailing `/`) the package lives under inside
    /// the archive. Candidates are tried under it first.
    pub fn with_root(mut self, root: &'a str) -> Self {
        self.root = root;
        self
    }

    #[instrument(skip_all, fields(name = %package.name, slots, mapped))]
    pub fn build(&self, package: &ModPackage) -> FileMapping {
        let mut mapping = FileMapping::new();
        let mut declared = 0;
        for (chapter, set) in &package.files {
            let folder = chapter.folder_name(package.game);
            if let Some(data) = &set.data_file {
                declared += 1;
                let slot = SlotId::data_file(chapter.clone());
                self.insert(&mut mapping, slot, data.provenance.as_ref(), &data.url, &folder);
            }
            for extra in &set.extra_files {
                declared += 1;
                let slot = SlotId::extra(chapter.clone(), extra.key.clone());
                self.insert(&mut mapping, slot, extra.provenance.as_ref(), &extra.url, &folder);
            }
        }
        if let Some(path) = self.exact([ICON_FILE_NAME.to_string()]) {
            mapping.insert(SlotId::Icon, SlotMatch { path, kind: MatchKind::Exact });
        }
        let span = tracing::Span::current();
        span.record("slots", declared);
        span.record("mapped", mapping.len());
        mapping
    }

    fn insert(&self, mapping: &mut FileMapping, slot: SlotId, provenance: Option<&Provenance>, url: &str, folder: &str) {
        match self.locate(provenance, url, folder) {
            Some(found) => {
                debug!(%slot, path = %found.path, kind = ?found.kind, "mapped slot");
                mapping.insert(slot, found);
            },
            None => debug!(%slot, %url, "no archive entry for slot"),
        }
    }

    fn locate(&self, provenance: Option<&Provenance>, url: &str, folder: &str) -> Option<SlotMatch> {
        let source = provenance.map(|provenance| normalize(&provenance.source_path)).filter(|source| !source.is_empty());
        let url = normalize(url);
        let name = basename(&url);
        let mut candidates = Vec::new();
        candidates.extend(source.clone());
        if !url.is_empty() {
            candidates.push(url.clone());
        }
        if !name.is_empty() {
            candidates.push(format!("{folder}/{name}"));
        }
        if let Some(path) = self.exact(candidates) {
            return Some(SlotMatch { path, kind: MatchKind::Exact });
        }

        let mut names: Vec<&str> = source.as_deref().map(basename).into_iter().collect();
        names.push(name);
        names
            .into_iter()
            .filter(|name| !name.is_empty())
            .find_map(|name| self.scan(name))
            .map(|path| SlotMatch { path, kind: MatchKind::Heuristic })
    }

    /// First candidate naming an existing file, each tried under the package
    /// root before the archive root.
    fn exact(&self, candidates: impl IntoIterator<Item = String>) -> Option<String> {
        candidates
            .into_iter()
            .flat_map(|candidate| {
                let rooted = (!self.root.is_empty()).then(|| format!("{}{candidate}", self.root));
                rooted.into_iter().chain([candidate])
            })
            .find(|path| self.is_file(path))
    }

    fn scan(&self, name: &str) -> Option<String> {
        self.entries
            .values()
            .find(|entry| !entry.is_directory && basename(&entry.path) == name)
            .map(|entry| entry.path.clone())
    }

    fn is_file(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(|entry| !entry.is_directory)
    }
}
