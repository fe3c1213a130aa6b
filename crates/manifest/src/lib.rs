//! Foreign patch-manifest support.
//!
//! Mods authored for the third-party patcher ship a metadata document
//! (`deltamodInfo.json` and friends) next to a patch manifest
//! (`modding.xml`) listing directives of the form *"apply `source` to
//! `target` as `type`"*. This crate:
//!
//! - reads every supported manifest shape into one flat list of
//!   [`PatchDirective`]s ([`ManifestSource`]),
//! - derives the owning chapter and relative location of each target path
//!   ([`resolve`]), and
//! - converts metadata plus directives into a canonical
//!   [`ModPackage`](deltahub_model::ModPackage) ([`Converter`]).
//!
//! Directives are always processed in document order; the conflict rules
//! of the converter (last xdelta wins, first override wins) depend on it.

mod consts;
mod convert;
mod directive;
pub mod error;
mod metadata;
mod resolve;
mod source;

pub use crate::convert::Converter;
pub use crate::directive::{PatchDirective, PatchKind};
pub use crate::metadata::ForeignMetadata;
pub use crate::resolve::{ResolvedPath, resolve, resolve_with_hint};
pub use crate::source::{ForeignManifest, ManifestSource};

/// File names of the foreign metadata document, in lookup order.
pub const METADATA_FILE_NAMES: [&str; 3] = ["deltamodInfo.json", "_deltamodInfo.json", "meta.json"];
/// File names of foreign patch manifests, in lookup order.
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["modding.xml", "modding.json"];
