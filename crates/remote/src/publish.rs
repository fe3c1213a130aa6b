use deltahub_model::ModPackage;
use tracing::{debug, info, instrument};

use crate::api::RemoteApi;
use crate::error::{ErrorKind, Result};
use crate::key::SecretKey;

/// Submits a new package under a freshly generated secret key.
///
/// The returned key is the only way to edit the package later; it is not
/// recoverable from what the service stores.
#[instrument(skip_all, fields(name = %package.name))]
pub async fn publish_new(api: &dyn RemoteApi, package: &ModPackage) -> Result<SecretKey> {
    let key = SecretKey::generate();
    api.submit_new_mod(&package.stripped(), &key.digest()).await?;
    info!("submitted new package");
    Ok(key)
}

/// Submits a change to a package published under `key`.
#[instrument(skip_all, fields(name = %package.name))]
pub async fn publish_change(api: &dyn RemoteApi, package: &ModPackage, key: &SecretKey) -> Result<()> {
    api.submit_mod_change(&package.stripped(), &key.digest()).await?;
    info!("submitted package change");
    Ok(())
}

/// Loads the package owned by `key`: the published version if there is
/// one, otherwise the pending submission.
#[instrument(skip_all)]
pub async fn load_public(api: &dyn RemoteApi, key: &SecretKey) -> Result<ModPackage> {
    let hashed = key.digest();
    match api.mod_data(&hashed).await {
        Ok(package) => return Ok(package),
        Err(err) if (*err).is_retryable() => return Err(err),
        Err(err) => debug!(error = %*err, "no published package, trying pending"),
    }
    match api.pending_mod_data(&hashed).await {
        Ok(package) => Ok(package),
        Err(err) if (*err).is_retryable() => Err(err),
        Err(err) => Err(err.raise(ErrorKind::UnknownKey)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use deltahub_model::{ChapterKey, DataFile, Game, Provenance};

    fn package() -> ModPackage {
        let mut package = ModPackage::new("Published", Game::Deltarune);
        package.files.entry(ChapterKey::new("1")).or_default().data_file =
            Some(DataFile::new("ch1.xdelta", "1.0.0").with_provenance(Provenance::default()));
        package
    }

    #[tokio::test]
    async fn test_publish_new_then_load_pending() {
        let api = MockApi::default();
        let key = publish_new(&api, &package()).await.unwrap();
        assert!(key.is_generated_shape());

        let stored = api.pending(&key.digest()).await.unwrap();
        assert!(!stored.has_provenance());

        let loaded = load_public(&api, &key).await.unwrap();
        assert_eq!(loaded.name, "Published");
    }

    #[tokio::test]
    async fn test_load_prefers_published() {
        let api = MockApi::default();
        let key: SecretKey = "RUNE-ABCDEFGHIJ1234".parse().unwrap();
        api.publish(&key.digest(), ModPackage::new("Live", Game::Deltarune)).await;
        api.submit_new_mod(&ModPackage::new("Pending", Game::Deltarune), &key.digest()).await.unwrap();
        assert_eq!(load_public(&api, &key).await.unwrap().name, "Live");
    }

    #[tokio::test]
    async fn test_load_unknown_key() {
        let api = MockApi::default();
        let key: SecretKey = "RUNE-ABCDEFGHIJ1234".parse().unwrap();
        let err = load_public(&api, &key).await.unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownKey);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let api = MockApi::default();
        api.set_offline(true).await;
        let key: SecretKey = "RUNE-ABCDEFGHIJ1234".parse().unwrap();
        let err = load_public(&api, &key).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Transport);
        let err = publish_change(&api, &package(), &key).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_publish_change() {
        let api = MockApi::default();
        let key: SecretKey = "RUNE-ABCDEFGHIJ1234".parse().unwrap();
        api.publish(&key.digest(), package()).await;
        let mut changed = package();
        changed.version = "1.1.0".to_string();
        publish_change(&api, &changed, &key).await.unwrap();
        assert_eq!(api.pending_change_data(&key.digest()).await.unwrap().version, "1.1.0");
    }
}
