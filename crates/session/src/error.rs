//! Session Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use deltahub_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};
use deltahub_manifest::error::{Error as ManifestError, ErrorKind as ManifestErrorKind};
use derive_more::{Display, Error};

/// A session error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive carries neither a canonical config nor a foreign marker.
    #[display("archive is not a recognized mod package")]
    UnrecognizedPackage,
    /// The package can not be exported yet; the message says why.
    #[display("package is not exportable: {_0}")]
    NotExportable(#[error(not(source))] String),
    /// An extra file with this key already exists in the chapter.
    #[display("duplicate extra file key: {_0}")]
    DuplicateKey(#[error(not(source))] String),
    /// The slot is not declared by the package.
    #[display("unknown slot: {_0}")]
    UnknownSlot(#[error(not(source))] String),
    /// More screenshots than a package may list.
    #[display("too many screenshots: {_0}")]
    TooManyScreenshots(#[error(not(source))] usize),
    /// Reading or writing the container failed.
    #[display("archive error: {_0}")]
    Archive(ArchiveErrorKind),
    /// The foreign package could not be interpreted.
    #[display("manifest error: {_0}")]
    Manifest(ManifestErrorKind),
    /// The background task running the work died.
    #[display("background task failed")]
    Task,
}
impl ErrorKind {
    /// Convert an archive error into a session error, preserving the archive
    /// crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn archive(err: ArchiveError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Archive(inner))
    }

    /// Convert a manifest error into a session error, preserving the manifest
    /// crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn manifest(err: ManifestError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Manifest(inner))
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Archive(inner) => inner.is_retryable(),
            Self::Task => true,
            _ => false,
        }
    }
}
