use std::io::{Cursor, Write};

use deltahub_model::paths::basename;
use deltahub_model::{CONFIG_FILE_NAME, ICON_FILE_NAME, ModPackage, Provenance, SlotId};
use exn::ResultExt;
use tracing::{debug, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{ErrorKind, Result};
use crate::{Container, Payload, SlotSource};

/// Serializes `package` and the payloads bound to its slots into a zip
/// container.
///
/// The config is written provenance-free and pretty-printed at the archive
/// root. Each bound payload lands at `<chapter folder>/<file name of url>`;
/// slots without a payload produce no entry. Extra files that are not
/// already archives (or that carry a recorded target path) are wrapped into
/// a nested single-entry zip first.
///
/// Output is deterministic: entries are written in path order with a fixed
/// timestamp.
#[instrument(skip(package, slots), fields(name = %package.name, entries, output_size))]
pub fn pack(package: &ModPackage, slots: &impl SlotSource) -> Result<Vec<u8>> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let config = serde_json::to_vec_pretty(&package.stripped()).or_raise(|| ErrorKind::InvalidConfig)?;
    files.push((CONFIG_FILE_NAME.to_string(), config));
    if let Some(icon) = slots.payload(&SlotId::Icon) {
        files.push((ICON_FILE_NAME.to_string(), icon.bytes.clone()));
    }

    for (chapter, set) in package.populated_chapters() {
        let folder = chapter.folder_name(package.game);
        if let Some(data) = &set.data_file {
            let slot = SlotId::data_file(chapter.clone());
            if let Some(payload) = slots.payload(&slot) {
                match entry_path(&folder, &data.url) {
                    Some(path) => files.push((path, payload.bytes.clone())),
                    None => warn!(%slot, "slot has bytes but no file name, skipping"),
                }
            }
        }
        for extra in &set.extra_files {
            let slot = SlotId::extra(chapter.clone(), extra.key.clone());
            let Some(payload) = slots.payload(&slot) else {
                continue;
            };
            let Some(path) = entry_path(&folder, &extra.url) else {
                warn!(%slot, "slot has bytes but no file name, skipping");
                continue;
            };
            let bytes = wrap_extra(payload, extra.provenance.as_ref(), basename(&path))?;
            files.push((path, bytes));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.dedup_by(|later, earlier| {
        let duplicate = later.0 == earlier.0;
        if duplicate {
            warn!(path = %later.0, "two slots pack to the same path, keeping the first");
        }
        duplicate
    });
    let output = write_zip(&files)?;
    let span = tracing::Span::current();
    span.record("entries", files.len());
    span.record("output_size", output.len());
    Ok(output)
}

fn entry_path(folder: &str, url: &str) -> Option<String> {
    let name = basename(url.trim());
    match name.is_empty() {
        true => None,
        false => Some(format!("{folder}/{name}")),
    }
}

/// Bytes to store for an extra file.
///
/// Archives pass through unchanged unless a target path was recorded for
/// them; everything else becomes a nested zip holding one file at the
/// recorded target path, or at the payload's own file name (falling back to
/// the entry name) without its container suffix.
fn wrap_extra(payload: &Payload, provenance: Option<&Provenance>, entry_name: &str) -> Result<Vec<u8>> {
    let target = provenance
        .map(|provenance| provenance.target_relative_path.as_str())
        .filter(|target| !target.is_empty());
    if payload.is_archive() && target.is_none() {
        return Ok(payload.bytes.clone());
    }
    let inner = match target {
        Some(target) => target.to_string(),
        None => {
            let name = payload.file_name.as_deref().map(basename).unwrap_or(entry_name);
            Container::strip_suffix(name).to_string()
        },
    };
    debug!(%inner, "wrapping extra file into nested archive");
    write_zip(&[(inner, payload.bytes.clone())])
}

fn write_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, bytes) in files {
        writer.start_file(path.as_str(), options).or_raise(|| ErrorKind::Write)?;
        writer.write_all(bytes).or_raise(|| ErrorKind::Write)?;
    }
    let cursor = writer.finish().or_raise(|| ErrorKind::Write)?;
    Ok(cursor.into_inner())
}
