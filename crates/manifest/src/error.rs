//! Manifest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A manifest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The foreign metadata document is not structured data we can read.
    #[display("malformed foreign metadata document")]
    MalformedMetadata,
    /// The patch manifest could not be parsed at all.
    #[display("malformed patch manifest")]
    MalformedManifest,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Broken input stays broken.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MalformedMetadata.to_string(), "malformed foreign metadata document");
        assert_eq!(ErrorKind::MalformedManifest.to_string(), "malformed patch manifest");
        assert!(!ErrorKind::MalformedManifest.is_retryable());
    }
}
