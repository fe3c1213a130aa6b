use std::time::Duration;

use async_trait::async_trait;
use deltahub_model::ModPackage;
use exn::{OptionExt, ResultExt};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::HashedKey;
use crate::api::RemoteApi;
use crate::error::{ErrorKind, Result};

/// Default `Referer` sent with every request.
pub const DEFAULT_REFERER: &str = "https://y114git.github.io";

/// [`RemoteApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}
impl HttpApi {
    /// Builds a client for the service at `base_url`.
    ///
    /// An empty `base_url` means no service is configured.
    pub fn new(base_url: &str, referer: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            exn::bail!(ErrorKind::NotConfigured);
        }
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(referer).or_raise(|| ErrorKind::NotConfigured)?;
        headers.insert(REFERER, referer);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::NotConfigured)?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, query, body), fields(status))]
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<(&str, &str)>,
        body: Option<Value>,
    ) -> Result<T> {
        let mut request = self.client.request(method, format!("{}/{endpoint}", self.base_url));
        if let Some(query) = query {
            request = request.query(&[query]);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.or_raise(|| ErrorKind::Transport)?;
        let status = response.status();
        tracing::Span::current().record("status", status.as_u16());
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Transport)?;
        // Error bodies are not always JSON.
        let result: Option<Value> = serde_json::from_slice(&bytes).ok();
        if !status.is_success() {
            let message = rejection_message(status, result.as_ref());
            debug!(%message, "request rejected");
            exn::bail!(ErrorKind::Rejected(message));
        }
        let result = result.ok_or_raise(|| ErrorKind::InvalidResponse)?;
        serde_json::from_value(result).or_raise(|| ErrorKind::InvalidResponse)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, key: &HashedKey) -> Result<T> {
        self.request(Method::GET, endpoint, Some(("modId", key.as_str())), None).await
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        self.request(Method::POST, endpoint, None, Some(body)).await
    }
}

/// The service's own `error` message, or `HTTP <status>`.
pub(crate) fn rejection_message(status: StatusCode, body: Option<&Value>) -> String {
    body.and_then(|body| body.get("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn submission(package: &ModPackage, key: &HashedKey) -> Value {
    serde_json::json!({ "modData": package.stripped(), "hashedKey": key.as_str() })
}

fn key_only(key: &HashedKey) -> Value {
    serde_json::json!({ "hashedKey": key.as_str() })
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn global_settings(&self) -> Result<Value> {
        self.request(Method::GET, "getGlobalSettings", None, None).await
    }

    async fn mod_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.get("getModData", key).await
    }

    async fn pending_mod_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.get("getPendingModData", key).await
    }

    async fn pending_change_data(&self, key: &HashedKey) -> Result<ModPackage> {
        self.get("getPendingChangeData", key).await
    }

    async fn submit_new_mod(&self, package: &ModPackage, key: &HashedKey) -> Result<Value> {
        self.post("submitNewMod", submission(package, key)).await
    }

    async fn submit_mod_change(&self, package: &ModPackage, key: &HashedKey) -> Result<Value> {
        self.post("submitModChange", submission(package, key)).await
    }

    async fn withdraw_pending_mod(&self, key: &HashedKey) -> Result<Value> {
        self.post("withdrawPendingMod", key_only(key)).await
    }

    async fn withdraw_pending_change(&self, key: &HashedKey) -> Result<Value> {
        self.post("withdrawPendingChange", key_only(key)).await
    }

    async fn delete_public_mod(&self, key: &HashedKey) -> Result<Value> {
        self.post("deletePublicMod", key_only(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecretKey;
    use deltahub_model::{ChapterKey, ExtraFile, Game, Provenance};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(StatusCode::BAD_REQUEST, Some(json!({"error": "Invalid key"})), "Invalid key")]
    #[case(StatusCode::NOT_FOUND, Some(json!({"error": ""})), "HTTP 404")]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, Some(json!({"message": "boom"})), "HTTP 500")]
    #[case(StatusCode::BAD_GATEWAY, None, "HTTP 502")]
    fn test_rejection_message(#[case] status: StatusCode, #[case] body: Option<Value>, #[case] expected: &str) {
        assert_eq!(rejection_message(status, body.as_ref()), expected);
    }

    #[test]
    fn test_submission_body() {
        let mut package = ModPackage::new("Remote", Game::Deltarune);
        package.files.entry(ChapterKey::new("1")).or_default().extra_files.push(
            ExtraFile::new("k", "k.zip", "1.0.0").with_provenance(Provenance {
                source_path: "secret/local/path.png".to_string(),
                target_relative_path: "k.png".to_string(),
            }),
        );
        let key: SecretKey = "RUNE-ABCDEFGHIJ1234".parse().unwrap();
        let body = submission(&package, &key.digest());
        assert_eq!(body["modData"]["name"], "Remote");
        assert_eq!(body["hashedKey"], key.digest().as_str());
        assert!(!body.to_string().contains("secret/local/path.png"));
        assert!(!body.to_string().contains("RUNE-"));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_not_configured(#[case] base_url: &str) {
        let err = HttpApi::new(base_url, DEFAULT_REFERER, Duration::from_secs(5)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotConfigured);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpApi::new("https://example.com/api/", DEFAULT_REFERER, Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "https://example.com/api");
    }
}
