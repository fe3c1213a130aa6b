use std::collections::BTreeMap;

use deltahub_model::paths::basename;
use deltahub_model::{ChapterFileSet, ChapterKey, DEFAULT_VERSION, DataFile, ExtraFile, Game, ModPackage, Provenance, Tag};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, instrument};

use crate::directive::{PatchDirective, PatchKind};
use crate::error::Result;
use crate::metadata::ForeignMetadata;
use crate::resolve::resolve_with_hint;
use crate::source::ForeignManifest;

const DEFAULT_NAME: &str = "Local Mod";
const DEFAULT_AUTHOR: &str = "Unknown";
const DEFAULT_TAGLINE: &str = "No description";
const DEFAULT_GAME_VERSION: &str = "Not specified";

/// Converts foreign packages into canonical [`ModPackage`]s.
///
/// The converter is pure apart from its clock, which only feeds the local
/// package key and the creation date. Pin it with [`Converter::at`] to get
/// fully reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    now: Option<OffsetDateTime>,
}
impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}
impl Converter {
    /// A converter reading the system clock.
    pub fn new() -> Self {
        Self { now: None }
    }

    /// A converter with a fixed clock.
    pub fn at(now: OffsetDateTime) -> Self {
        Self { now: Some(now) }
    }

    #[instrument(skip(self, manifest), fields(name = manifest.metadata.name.as_deref(), directives))]
    pub fn convert(&self, manifest: &ForeignManifest) -> Result<ModPackage> {
        let directives = manifest.directives()?;
        tracing::Span::current().record("directives", directives.len());
        let metadata = &manifest.metadata;
        let now = self.now.unwrap_or_else(OffsetDateTime::now_utc);
        let version = metadata.version.clone().unwrap_or_else(|| DEFAULT_VERSION.to_string());
        Ok(ModPackage {
            key: Some(package_key(metadata, now)),
            is_local_mod: true,
            created_date: created_date(now),
            is_available_on_server: false,
            name: metadata.name.clone().unwrap_or_else(|| DEFAULT_NAME.to_string()),
            author: metadata.author().unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            tagline: metadata.description.clone().unwrap_or_else(|| DEFAULT_TAGLINE.to_string()),
            external_url: metadata.url.clone().unwrap_or_default(),
            game_version: metadata.target_game_version.clone().unwrap_or_else(|| DEFAULT_GAME_VERSION.to_string()),
            game: match metadata.demo {
                true => Game::DeltaruneDemo,
                false => Game::Deltarune,
            },
            tags: metadata.tags.iter().filter_map(|tag| tag.parse::<Tag>().ok()).collect(),
            files: Self::convert_directives(&directives, &version),
            version,
            ..ModPackage::default()
        })
    }

    /// Builds the chapter file sets for `directives`, in order.
    ///
    /// Within a chapter the last xdelta directive provides the data file and
    /// the first override directive claims each archive key; later
    /// directives reducing to the same key are dropped.
    pub fn convert_directives(directives: &[PatchDirective], version: &str) -> BTreeMap<ChapterKey, ChapterFileSet> {
        let mut files: BTreeMap<ChapterKey, ChapterFileSet> = BTreeMap::new();
        for directive in directives {
            if directive.source.is_empty() {
                debug!(path = %directive.target, "skipping directive without a source");
                continue;
            }
            let resolved = resolve_with_hint(&directive.target, directive.chapter.as_ref());
            let Some(chapter) = resolved.chapter.clone() else {
                debug!(path = %directive.target, "skipping directive with unresolved chapter");
                continue;
            };
            let provenance = Provenance {
                source_path: directive.source.clone(),
                target_relative_path: resolved.relative_path(),
            };
            match &directive.kind {
                PatchKind::Xdelta => {
                    let data = DataFile::new(basename(&directive.source), version).with_provenance(provenance);
                    files.entry(chapter).or_default().data_file = Some(data);
                },
                PatchKind::Override => {
                    let key = resolved.archive_key();
                    let set = files.entry(chapter).or_default();
                    if set.extra(&key).is_some() {
                        debug!(%key, path = %directive.target, "skipping directive with duplicate archive key");
                        continue;
                    }
                    let url = format!("extra_file_{key}.zip");
                    set.extra_files.push(ExtraFile::new(key, url, DEFAULT_VERSION).with_provenance(provenance));
                },
                PatchKind::Other(kind) => {
                    debug!(%kind, path = %directive.target, "skipping directive of unsupported type");
                },
            }
        }
        files
    }
}

fn package_key(metadata: &ForeignMetadata, now: OffsetDateTime) -> String {
    match metadata.known_package_id() {
        Some(id) => id.replace('.', "_"),
        None => {
            let millis = (now.unix_timestamp_nanos() / 1_000_000).max(0) as u128;
            let name = metadata.name.as_deref().unwrap_or("unnamed");
            format!("local_{name}_{}", base36(millis))
        },
    }
}

fn created_date(now: OffsetDateTime) -> Option<String> {
    now.format(format_description!("[day].[month].[year repr:last_two], [hour]:[minute]")).ok()
}

fn base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
