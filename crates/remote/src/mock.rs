//! In-memory publishing service for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use deltahub_model::ModPackage;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::HashedKey;
use crate::api::RemoteApi;
use crate::error::{ErrorKind, Result};

#[derive(Default)]
struct State {
    offline: bool,
    published: HashMap<HashedKey, ModPackage>,
    pending: HashMap<HashedKey, ModPackage>,
    pending_changes: HashMap<HashedKey, ModPackage>,
}

/// In-memory [`RemoteApi`].
///
/// Packages live in maps behind a [`RwLock`], so all trait methods operate
/// on `&self`. Rejections use the messages the real service sends. Going
/// [offline](Self::set_offline) turns every call into a transport failure.
#[derive(Default)]
pub struct MockApi {
    state: RwLock<State>,
}
impl MockApi {
    /// Stores `package` as published, as if a submission had been approved.
    pub async fn publish(&self, key: &HashedKey, package: ModPackage) {
        self.state.write().await.published.insert(key.clone(), package);
    }

    pub async fn pending(&self, key: &HashedKey) -> Option<ModPackage> {
        self.state.read().await.pending.get(key).cloned()
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    async fn lookup(&self, key: &HashedKey, pick: fn(&State) -> &HashMap<HashedKey, ModPackage>) -> Result<ModPackage> {
        let state = self.state.read().await;
        if state.offline {
            exn::bail!(ErrorKind::Transport);
        }
        match pick(&state).get(key) {
            Some(package) => Ok(package.clone()),
            None => exn::bail!(ErrorKind::Rejected("Mod not found".to_string())),
        }
    }

    async fn remove(&self, key: &HashedKey, pick: fn(&mut State) -> &mut HashMap<HashedKey, ModPackage>) -> Result<Value> {
        self.online().await?;
        let mut state = self.state.write().await;
        match pick(&mut state).remove(key) {
            Some(_) => Ok(json!({ "success": true })),
            None => exn::bail!(ErrorKind::Rejected("Mod not found".to_string())),
        }
    }

    async fn online(&self) -> Result<()> {
        if self.state.read().await.offline {
            exn::bail!(ErrorKind::Transport);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for MockApi {
    async fn global_settings(&self) -> Result<Value> {
        self.online().await?;
        Ok(json!({}))
    }

    async fn mod_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.lookup(key, |state| &state.published).await
    }

    async fn pending_mod_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.lookup(key, |state| &state.pending).await
    }

    async fn pending_change_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.lookup(key, |state| &state.pending_changes).await
    }

    async fn submit_new_mod(&self, package: &ModPackage, key: &HashedKey) -> Result<Value> {
        self.online().await?;
        let mut state = self.state.write().await;
        if state.pending.contains_key(key) {
            exn::bail!(ErrorKind::Rejected("Key already in use".to_string()));
        }
        state.pending.insert(key.clone(), package.clone());
        Ok(json!({ "success": true }))
    }

    async fn submit_mod_change(&self, package: &ModPackage, key: &HashedKey) -> Result<Value> {
        self.online().await?;
        let mut state = self.state.write().await;
        if !state.published.contains_key(key) {
            exn::bail!(ErrorKind::Rejected("Mod not found".to_string()));
        }
        state.pending_changes.insert(key.clone(), package.clone());
        Ok(json!({ "success": true }))
    }

    async fn withdraw_pending_mod(&self, key: &HashedKey) -> Result<Value> {
        self.remove(key, |state| &mut state.pending).await
    }

    async fn withdraw_pending_change(&self, key: &HashedKey) -> Result<Value> {
        self.remove(key, |state| &mut state.pending_changes).await
    }

    async fn delete_public_mod(&self, key: &HashedKey) -> Result<Value> {
        self.remove(key, |state| &mut state.published).await
    }
}
