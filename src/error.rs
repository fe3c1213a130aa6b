//! CLI Error Types
//!
//! Errors from the library crates are re-raised into [`ErrorKind`] so the
//! whole chain ends up in one `exn` tree that `main` can print.

use std::path::PathBuf;

use deltahub_config::error::{Error as ConfigError, ErrorKind as ConfigErrorKind};
use deltahub_remote::error::{Error as RemoteError, ErrorKind as RemoteErrorKind};
use deltahub_session::error::{Error as SessionError, ErrorKind as SessionErrorKind};
use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file named on the command line could not be read or written.
    #[display("could not access {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// A command-line argument is malformed.
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    #[display("configuration error: {_0}")]
    Config(ConfigErrorKind),
    #[display("{_0}")]
    Session(SessionErrorKind),
    #[display("{_0}")]
    Remote(RemoteErrorKind),
}
impl ErrorKind {
    #[track_caller]
    pub fn config(err: ConfigError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Config(inner))
    }

    #[track_caller]
    pub fn session(err: SessionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Session(inner))
    }

    #[track_caller]
    pub fn remote(err: RemoteError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Remote(inner))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Session(inner) => inner.is_retryable(),
            Self::Remote(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}
