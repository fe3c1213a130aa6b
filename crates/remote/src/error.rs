//! Remote Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A remote service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No service address is configured.
    #[display("remote service is not configured")]
    NotConfigured,
    /// The request never produced a response (connection, timeout, TLS).
    #[display("transport error")]
    Transport,
    /// The service answered with an error; carries its message.
    #[display("rejected by service: {_0}")]
    Rejected(#[error(not(source))] String),
    /// The service answered successfully but the body is not what was asked for.
    #[display("unexpected response body")]
    InvalidResponse,
    /// No published or pending package belongs to the secret key.
    #[display("no package found for this secret key")]
    UnknownKey,
    /// The secret key is empty.
    #[display("invalid secret key")]
    InvalidKey,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }
}
