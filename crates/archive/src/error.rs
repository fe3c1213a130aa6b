//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The blob is not a readable container. Don't retry with the same input.
    #[display("invalid or corrupted archive")]
    InvalidArchive,
    /// The container format is recognized but can not be read.
    #[display("unsupported container: {_0}")]
    UnsupportedContainer(#[error(not(source))] String),
    /// The archive's canonical config is not a valid package description.
    #[display("invalid package config")]
    InvalidConfig,
    /// Writing the output container failed.
    #[display("failed to write archive")]
    Write,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Everything happens in memory; only writing could hit a transient
        // allocation or encoder failure.
        matches!(self, ErrorKind::Write)
    }
}
