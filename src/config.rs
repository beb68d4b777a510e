//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::Display;

use crate::error::{GatewayError, Result};

/// Which key-value store the gateway reads from and writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map, lost on restart.
    #[default]
    Memory,
    /// Cloudflare Workers KV over its REST API.
    Cloudflare,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port for the gateway API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,

    // === Store Configuration ===
    /// Store backend: memory or cloudflare.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Cloudflare account owning the KV namespace.
    #[serde(default)]
    pub cloudflare_account_id: Option<String>,

    /// Workers KV namespace id.
    #[serde(default)]
    pub cloudflare_namespace_id: Option<String>,

    /// API token with KV read/write permission.
    #[serde(default)]
    pub cloudflare_api_token: Option<String>,

    /// Cloudflare API base URL.
    #[serde(default = "default_cloudflare_api_url")]
    pub cloudflare_api_url: String,

    /// Keys requested per listing page (Workers KV allows 10..=1000).
    #[serde(default = "default_list_page_size")]
    pub kv_list_page_size: u32,

    /// Per-request timeout for store calls.
    #[serde(default = "default_kv_timeout")]
    pub kv_timeout_seconds: u64,

    // === Access Policy ===
    /// Bearer token required on POST /api/sync. Unset leaves the endpoint open.
    #[serde(default)]
    pub sync_token: Option<String>,

    // === Metrics ===
    /// Port for the Prometheus scrape listener. Unset disables the exporter.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cloudflare_api_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_list_page_size() -> u32 {
    1000
}

fn default_kv_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
            store_backend: StoreBackend::default(),
            cloudflare_account_id: None,
            cloudflare_namespace_id: None,
            cloudflare_api_token: None,
            cloudflare_api_url: default_cloudflare_api_url(),
            kv_list_page_size: default_list_page_size(),
            kv_timeout_seconds: default_kv_timeout(),
            sync_token: None,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    /// Validate, handing the configuration back when it can be served.
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(GatewayError::InvalidConfig)?;
        Ok(self)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.store_backend == StoreBackend::Cloudflare {
            let missing = [
                ("CLOUDFLARE_ACCOUNT_ID", &self.cloudflare_account_id),
                ("CLOUDFLARE_NAMESPACE_ID", &self.cloudflare_namespace_id),
                ("CLOUDFLARE_API_TOKEN", &self.cloudflare_api_token),
            ]
            .iter()
            .find(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name);

            if let Some(name) = missing {
                return Err(format!("{} is required for the cloudflare store", name));
            }
        }

        if !(10..=1000).contains(&self.kv_list_page_size) {
            return Err("KV_LIST_PAGE_SIZE must be between 10 and 1000".to_string());
        }

        if self.kv_timeout_seconds == 0 {
            return Err("KV_TIMEOUT_SECONDS must be greater than 0".to_string());
        }

        if self.sync_token.as_deref() == Some("") {
            return Err("SYNC_TOKEN must not be empty when set".to_string());
        }

        if self.metrics_port.is_some() && self.metrics_port == Some(self.port) {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }

    /// Whether POST /api/sync requires a bearer token.
    pub fn sync_requires_token(&self) -> bool {
        self.sync_token.is_some()
    }
}
