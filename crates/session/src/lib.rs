//! Edit sessions over mod packages.
//!
//! An [`EditSession`] pairs a [`ModPackage`](deltahub_model::ModPackage)
//! with a [`SlotRegistry`] holding the bytes bound to its slots. Sessions
//! are created by [`import`]ing an archive (canonical or foreign), edited
//! through pure operations that each return a new session, and turned back
//! into an archive by [`export`].
//!
//! Import and export run the container work on a blocking task; no session
//! state is shared with that task, so abandoning the future simply drops
//! the result.

pub mod error;
mod mapping;
mod registry;
mod session;
mod transfer;

pub use crate::mapping::{FileMapping, MappingBuilder, MatchKind, SlotMatch};
pub use crate::registry::SlotRegistry;
pub use crate::session::EditSession;
pub use crate::transfer::{ImportSource, Imported, export, export_blocking, import, import_blocking, import_with};
