use deltahub_archive::{Payload, Unpacked, pack, unpack};
use deltahub_manifest::{Converter, ForeignManifest, ForeignMetadata, ManifestSource};
use deltahub_model::ModPackage;
use deltahub_model::paths::basename;
use exn::ResultExt;
use tracing::{info, instrument};

use crate::error::{ErrorKind, Result};
use crate::mapping::{FileMapping, MappingBuilder};
use crate::registry::SlotRegistry;
use crate::session::EditSession;

/// Which representation an imported archive was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    /// The archive's own `mod_config.json`.
    Canonical,
    /// Converted from a foreign metadata document and patch manifest.
    Foreign,
}

/// Result of importing an archive.
#[derive(Debug, Clone)]
pub struct Imported {
    pub session: EditSession,
    pub mapping: FileMapping,
    pub source: ImportSource,
}

/// Imports an archive blob on a blocking task.
///
/// Nothing is committed anywhere until the returned future completes;
/// dropping it discards the work.
pub async fn import(blob: Vec<u8>) -> Result<Imported> {
    import_with(blob, Converter::new()).await
}

pub async fn import_with(blob: Vec<u8>, converter: Converter) -> Result<Imported> {
    tokio::task::spawn_blocking(move || import_blocking(&blob, &converter))
        .await
        .or_raise(|| ErrorKind::Task)?
}

/// Synchronous core of [`import`].
///
/// A foreign marker takes precedence over a canonical config when an
/// archive carries both.
#[instrument(skip(blob, converter), fields(blob_size = blob.len(), source, slots))]
pub fn import_blocking(blob: &[u8], converter: &Converter) -> Result<Imported> {
    let unpacked = unpack(blob).map_err(ErrorKind::archive)?;
    if !unpacked.is_recognized() {
        exn::bail!(ErrorKind::UnrecognizedPackage);
    }
    let (package, source) = match (&unpacked.config, unpacked.is_foreign_format) {
        (_, true) => (convert_foreign(&unpacked, converter)?, ImportSource::Foreign),
        (Some(config), false) => (config.clone(), ImportSource::Canonical),
        (None, false) => exn::bail!(ErrorKind::UnrecognizedPackage),
    };
    let mapping = MappingBuilder::new(&unpacked.entries)
        .with_root(&unpacked.root)
        .build(&package);
    let slots: SlotRegistry = mapping
        .iter()
        .filter_map(|(slot, found)| {
            let bytes = unpacked.file(&found.path)?;
            Some((slot.clone(), Payload::new(bytes).with_file_name(basename(&found.path))))
        })
        .collect();

    let span = tracing::Span::current();
    span.record("source", tracing::field::debug(source));
    span.record("slots", slots.len());
    info!(name = %package.name, mapped = slots.len(), "imported package");
    Ok(Imported {
        session: EditSession::with_slots(package, slots),
        mapping,
        source,
    })
}

fn convert_foreign(unpacked: &Unpacked, converter: &Converter) -> Result<ModPackage> {
    let metadata = match unpacked.foreign_metadata() {
        Some(path) => ForeignMetadata::parse(&unpacked.text(path).unwrap_or_default()).map_err(ErrorKind::manifest)?,
        None => ForeignMetadata::default(),
    };
    let source = match unpacked.foreign_manifest() {
        Some(path) => {
            let text = unpacked.text(path).unwrap_or_default();
            Some(ManifestSource::from_file(path, &text).map_err(ErrorKind::manifest)?)
        },
        None => None,
    };
    converter
        .convert(&ForeignManifest::new(metadata, source))
        .map_err(ErrorKind::manifest)
}

/// Packs a session into an archive blob on a blocking task, after checking
/// the export preconditions.
pub async fn export(session: &EditSession) -> Result<Vec<u8>> {
    session.ensure_exportable()?;
    let session = session.clone();
    tokio::task::spawn_blocking(move || export_blocking(&session))
        .await
        .or_raise(|| ErrorKind::Task)?
}

/// Synchronous core of [`export`]. Does not check the export preconditions.
#[instrument(skip(session), fields(name = %session.package().name))]
pub fn export_blocking(session: &EditSession) -> Result<Vec<u8>> {
    pack(session.package(), session.slots()).map_err(ErrorKind::archive)
}
