//! Canonical mod package model.
//!
//! A [`ModPackage`] describes a mod as metadata plus a set of payload files
//! grouped by game [chapter](ChapterKey). The package only ever carries
//! slot *metadata* (file names, versions, stable keys); the bytes backing a
//! slot live elsewhere and are bound to it through a [`SlotId`].
//!
//! The serde representation of these types *is* the canonical config file
//! format (`mod_config.json`), so field names here are part of the wire
//! format and must not be renamed casually.

mod chapter;
pub mod error;
mod game;
mod package;
pub mod paths;
mod slot;
mod tag;

pub use crate::chapter::ChapterKey;
pub use crate::game::Game;
pub use crate::package::{ChapterFileSet, DataFile, ExtraFile, ModPackage, Provenance};
pub use crate::slot::SlotId;
pub use crate::tag::Tag;

/// Name of the canonical config entry at the root of a packed archive.
pub const CONFIG_FILE_NAME: &str = "mod_config.json";
/// Name of the package icon entry at the root of a packed archive.
pub const ICON_FILE_NAME: &str = "icon.png";
/// Maximum number of screenshot URLs a package may list.
pub const MAX_SCREENSHOTS: usize = 10;
/// Version assigned to files and packages when none is known.
pub const DEFAULT_VERSION: &str = "1.0.0";

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace(['-', '_', ' '], "")
}
