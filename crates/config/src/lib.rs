//! Layered configuration.
//!
//! [`Settings`] are merged from, lowest priority first:
//!
//! 1. compiled defaults,
//! 2. `config.toml`, `config.yaml` and `config.json` in the platform config
//!    directory,
//! 3. an explicit file handed to [`Loader::file`],
//! 4. `DELTAHUB_*` environment variables, with `__` separating nested keys
//!    (`DELTAHUB_REMOTE__BASE_URL`).

pub mod error;
mod load;
mod settings;

pub use crate::load::Loader;
pub use crate::settings::{PackageSettings, RemoteSettings, Settings};

/// Prefix of environment variables read by [`Loader`].
pub const ENV_PREFIX: &str = "DELTAHUB_";
