//! Mod archive containers.
//!
//! A packed mod is a zip container holding the canonical config
//! (`mod_config.json`) at its root, an optional `icon.png`, and one folder
//! per chapter with the payload files the config references. This crate:
//!
//! - **detects** containers from extensions or magic bytes ([`Container`]),
//! - **unpacks** a blob into a flat entry table plus the format markers it
//!   carries ([`unpack`]), and
//! - **packs** a [`ModPackage`](deltahub_model::ModPackage) and the payloads
//!   bound to its slots into a new container ([`pack`]), wrapping loose
//!   override files into nested single-entry archives.
//!
//! Only zip containers can be read or written; 7z and rar are recognized so
//! that already-archived payloads pass through untouched.

mod container;
pub mod error;
mod pack;
mod unpack;

use std::collections::BTreeMap;

use deltahub_model::SlotId;

pub use crate::pack::pack;
pub use crate::unpack::{Unpacked, unpack};

/// A recognized archive container format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Container {
    /// Not an archive
    #[default]
    None,
    /// Zip (.zip)
    Zip,
    /// 7-Zip (.7z)
    SevenZip,
    /// RAR (.rar)
    Rar,
}

/// One entry of an unpacked archive.
///
/// Paths use `/` separators; directory entries carry no bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Option<Vec<u8>>,
    pub is_directory: bool,
}
impl ArchiveEntry {
    pub fn file(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes: Some(bytes),
            is_directory: false,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bytes: None,
            is_directory: true,
        }
    }
}

/// Bytes bound to a slot, ready to be packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    /// Whether the bytes already are an archive. `None` sniffs the content.
    pub archive: Option<bool>,
    /// Name of the file the bytes were loaded from, if known.
    pub file_name: Option<String>,
}
impl Payload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            archive: None,
            file_name: None,
        }
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn is_archive(&self) -> bool {
        self.archive.unwrap_or_else(|| Container::from_magic_bytes(&self.bytes).is_archive())
    }
}

/// Anything that can hand out the payload bound to a slot.
pub trait SlotSource {
    fn payload(&self, slot: &SlotId) -> Option<&Payload>;
}
impl SlotSource for BTreeMap<SlotId, Payload> {
    fn payload(&self, slot: &SlotId) -> Option<&Payload> {
        self.get(slot)
    }
}
