//! Client side of the DELTAHUB publishing service.
//!
//! The service is an opaque JSON API ([`RemoteApi`]) addressed by the
//! SHA-256 digest of a per-package [`SecretKey`]. [`HttpApi`] talks to the
//! real service; the `publish_*`/[`load_public`] helpers implement the
//! author workflow on top of any implementation.

mod api;
pub mod error;
mod http;
mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod publish;

pub use crate::api::RemoteApi;
pub use crate::http::{DEFAULT_REFERER, HttpApi};
pub use crate::key::{HashedKey, SecretKey};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockApi;
pub use crate::publish::{load_public, publish_change, publish_new};
