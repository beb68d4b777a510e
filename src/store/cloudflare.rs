//! Cloudflare Workers KV client over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{observe, SnapshotStore};
use crate::config::Config;
use crate::error::StoreError;

/// Workers KV namespace accessed through `api.cloudflare.com`.
#[derive(Debug, Clone)]
pub struct CloudflareKvStore {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// `.../accounts/<id>/storage/kv/namespaces/<id>` base.
    namespace_url: Url,
    /// API token sent as a bearer credential.
    api_token: String,
    /// Keys requested per listing page.
    page_size: u32,
}

/// Envelope wrapping every non-value API response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    cursor: Option<String>,
}

/// One entry of a key listing.
#[derive(Debug, Deserialize)]
struct KeyEntry {
    name: String,
}

impl CloudflareKvStore {
    /// Create a client for the namespace named in `config`.
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StoreError::Unavailable(format!("{} is not configured", name)))
        };

        let account_id = required(&config.cloudflare_account_id, "CLOUDFLARE_ACCOUNT_ID")?;
        let namespace_id = required(&config.cloudflare_namespace_id, "CLOUDFLARE_NAMESPACE_ID")?;
        let api_token = required(&config.cloudflare_api_token, "CLOUDFLARE_API_TOKEN")?;

        Self::new(
            &config.cloudflare_api_url,
            &account_id,
            &namespace_id,
            api_token,
            config.kv_list_page_size,
            Duration::from_secs(config.kv_timeout_seconds),
        )
    }

    /// Create a client from explicit parts.
    pub fn new(
        api_url: &str,
        account_id: &str,
        namespace_id: &str,
        api_token: String,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut namespace_url = Url::parse(api_url)?;
        namespace_url
            .path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("{} is not a base url", api_url)))?
            .pop_if_empty()
            .extend([
                "accounts",
                account_id,
                "storage",
                "kv",
                "namespaces",
                namespace_id,
            ]);

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            namespace_url,
            api_token,
            page_size,
        })
    }

    /// URL of a single value; the key is percent-encoded as one segment.
    fn value_url(&self, key: &str) -> Url {
        let mut url = self.namespace_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(["values", key]);
        }
        url
    }

    fn keys_url(&self, cursor: Option<&str>) -> Url {
        let mut url = self.namespace_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("keys");
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        url
    }

    /// Turn a failed response into a `StoreError`, preferring the API's own message.
    async fn api_error(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiEnvelope<Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.errors.into_iter().next())
            .map(|e| format!("{} (code {})", e.message, e.code))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        StoreError::Api {
            status: status.as_u16(),
            message,
        }
    }

    async fn fetch_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .http
            .get(self.value_url(key))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(key, "Key not found");
            return Ok(None);
        }

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            warn!(key, error = %err, "KV get failed");
            return Err(err);
        }

        let body = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .http
                .get(self.keys_url(cursor.as_deref()))
                .bearer_auth(&self.api_token)
                .send()
                .await?;

            if !response.status().is_success() {
                let err = Self::api_error(response).await;
                warn!(error = %err, "KV list failed");
                return Err(err);
            }

            let page: ApiEnvelope<Vec<KeyEntry>> = response.json().await?;
            if !page.success {
                let message = page
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| e.message)
                    .unwrap_or_else(|| "list request unsuccessful".to_string());
                return Err(StoreError::Api {
                    status: 200,
                    message,
                });
            }

            keys.extend(page.result.unwrap_or_default().into_iter().map(|k| k.name));
            debug!(count = keys.len(), "Fetched key page");

            match page.result_info.and_then(|info| info.cursor) {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn store_value(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.value_url(key))
            .bearer_auth(&self.api_token)
            .json(&value)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            warn!(key, error = %err, "KV put failed");
            return Err(err);
        }

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for CloudflareKvStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        observe("get", self.fetch_value(key)).await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        observe("list", self.list_keys()).await
    }

    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        observe("put", self.store_value(key, value)).await
    }
}
