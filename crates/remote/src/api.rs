use async_trait::async_trait;
use deltahub_model::ModPackage;
use serde_json::Value;

use crate::HashedKey;
use crate::error::Result;

/// The publishing service's request/response surface.
///
/// Packages are addressed by the [digest](crate::SecretKey::digest) of
/// their secret key. Every call is an opaque JSON exchange; callers only
/// distinguish success from failure.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Service-wide settings (announcements, feature switches, ...).
    async fn global_settings(&self) -> Result<Value>;

    /// The published version of a package.
    async fn mod_data(&self, key: &HashedKey) -> Result<ModPackage>;

    /// A submitted package still awaiting review.
    async fn pending_mod_data(&self, key: &HashedKey) -> Result<ModPackage>;

    /// A submitted change to a published package still awaiting review.
    async fn pending_change_data(&self, key: &HashedKey) -> Result<ModPackage>;

    async fn submit_new_mod(&self, package: &ModPackage, key: &HashedKey) -> Result<Value>;

    async fn submit_mod_change(&self, package: &ModPackage, key: &HashedKey) -> Result<Value>;

    async fn withdraw_pending_mod(&self, key: &HashedKey) -> Result<Value>;

    async fn withdraw_pending_change(&self, key: &HashedKey) -> Result<Value>;

    async fn delete_public_mod(&self, key: &HashedKey) -> Result<Value>;
}
