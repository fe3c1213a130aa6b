use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use deltahub_manifest::{MANIFEST_FILE_NAMES, METADATA_FILE_NAMES};
use deltahub_model::paths::{basename, dirname, normalize};
use deltahub_model::{CONFIG_FILE_NAME, ModPackage};
use exn::ResultExt;
use tracing::{debug, instrument};
use zip::ZipArchive;

use crate::error::{ErrorKind, Result};
use crate::{ArchiveEntry, Container};

/// Flat view of an unpacked archive plus the format markers found in it.
#[derive(Debug, Clone, Default)]
pub struct Unpacked {
    /// The canonical config, when the archive carries one.
    pub config: Option<ModPackage>,
    /// Whether a foreign metadata document or patch manifest is present.
    pub is_foreign_format: bool,
    /// Directory prefix (with trailing `/`) of the package inside the
    /// archive; empty when the markers sit at the archive root.
    pub root: String,
    pub entries: BTreeMap<String, ArchiveEntry>,
    metadata_path: Option<String>,
    manifest_path: Option<String>,
}
impl Unpacked {
    /// Neither a canonical config nor a foreign marker: not a mod package.
    pub fn is_recognized(&self) -> bool {
        self.config.is_some() || self.is_foreign_format
    }

    /// Bytes of a non-directory entry.
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .get(path)
            .filter(|entry| !entry.is_directory)
            .and_then(|entry| entry.bytes.as_deref())
    }

    /// Contents of a file entry as text, without a leading byte-order mark.
    pub fn text(&self, path: &str) -> Option<String> {
        let text = String::from_utf8_lossy(self.file(path)?).into_owned();
        Some(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
    }

    /// Files, in path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .values()
            .filter(|entry| !entry.is_directory)
            .filter_map(|entry| Some((entry.path.as_str(), entry.bytes.as_deref()?)))
    }

    /// Path of the first entry named like one of `names`, looking at the
    /// archive root first and then exactly one directory level down.
    pub fn marker(&self, names: &[&str]) -> Option<&str> {
        find_marker(&self.entries, names, &[])
    }

    /// Path of the foreign metadata document. Files inside the payload
    /// folders of a canonical config never count.
    pub fn foreign_metadata(&self) -> Option<&str> {
        self.metadata_path.as_deref()
    }

    /// Path of the foreign patch manifest, with the same exclusion as
    /// [`foreign_metadata`](Self::foreign_metadata).
    pub fn foreign_manifest(&self) -> Option<&str> {
        self.manifest_path.as_deref()
    }
}

fn find_marker<'a>(entries: &'a BTreeMap<String, ArchiveEntry>, names: &[&str], skip_dirs: &[String]) -> Option<&'a str> {
    let is_marker = |entry: &&ArchiveEntry| {
        !entry.is_directory
            && names.iter().any(|name| *name == basename(&entry.path))
            && !skip_dirs.iter().any(|dir| entry.path.starts_with(dir.as_str()))
    };
    let at_root = entries.values().filter(is_marker).find(|entry| !entry.path.contains('/'));
    let nested = || {
        entries
            .values()
            .filter(is_marker)
            .find(|entry| dirname(&entry.path).matches('/').count() == 1)
    };
    at_root.or_else(nested).map(|entry| entry.path.as_str())
}

/// Reads a container blob into an [`Unpacked`] entry table.
///
/// Fails only when the blob is not a readable zip container or when a
/// canonical config is present but is not a valid package description.
/// Recognizing the result as a mod package is left to the caller
/// ([`Unpacked::is_recognized`]).
#[instrument(skip(blob), fields(blob_size = blob.len(), entries, foreign))]
pub fn unpack(blob: &[u8]) -> Result<Unpacked> {
    match Container::from_magic_bytes(blob) {
        container @ (Container::SevenZip | Container::Rar) => {
            exn::bail!(ErrorKind::UnsupportedContainer(container.to_string()))
        },
        Container::None | Container::Zip => {},
    }
    let mut archive = ZipArchive::new(Cursor::new(blob)).or_raise(|| ErrorKind::InvalidArchive)?;
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).or_raise(|| ErrorKind::InvalidArchive)?;
        let path = normalize(file.name());
        if file.is_dir() {
            let path = path.trim_end_matches('/').to_string();
            entries.insert(path.clone(), ArchiveEntry::directory(path));
            continue;
        }
        // The declared size is untrusted; never reserve more than the blob holds.
        let capacity = file.size().min(blob.len() as u64);
        let mut bytes = Vec::with_capacity(usize::try_from(capacity).unwrap_or_default());
        file.read_to_end(&mut bytes).or_raise(|| ErrorKind::InvalidArchive)?;
        entries.insert(path.clone(), ArchiveEntry::file(path, bytes));
    }

    let mut unpacked = Unpacked {
        entries,
        ..Unpacked::default()
    };
    let config_path = unpacked.marker(&[CONFIG_FILE_NAME]).map(str::to_string);
    let mut payload_dirs = Vec::new();
    if let Some(path) = &config_path {
        let text = unpacked.text(path).unwrap_or_default();
        let config: ModPackage = serde_json::from_str(&text).or_raise(|| ErrorKind::InvalidConfig)?;
        debug!(%path, name = %config.name, "found canonical config");
        payload_dirs = config
            .files
            .keys()
            .map(|chapter| format!("{}{}/", dirname(path), chapter.folder_name(config.game)))
            .collect();
        unpacked.config = Some(config);
    }
    unpacked.metadata_path = find_marker(&unpacked.entries, &METADATA_FILE_NAMES, &payload_dirs).map(str::to_string);
    unpacked.manifest_path = find_marker(&unpacked.entries, &MANIFEST_FILE_NAMES, &payload_dirs).map(str::to_string);
    let foreign_path = unpacked.metadata_path.clone().or_else(|| unpacked.manifest_path.clone());
    unpacked.is_foreign_format = foreign_path.is_some();
    // Foreign markers take precedence on import, so their directory anchors
    // provenance paths.
    unpacked.root = foreign_path
        .or(config_path)
        .map(|path| dirname(&path).to_string())
        .unwrap_or_default();

    let span = tracing::Span::current();
    span.record("entries", unpacked.entries.len());
    span.record("foreign", unpacked.is_foreign_format);
    Ok(unpacked)
}
