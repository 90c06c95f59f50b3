use crate::error::{Result, SyncError};
use quill_graphql::protocol::DEFAULT_LIST_LIMIT;
use quill_graphql::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Environment override for the backend endpoint.
pub const ENDPOINT_ENV: &str = "QUILL_ENDPOINT";
/// Environment override for the backend API key.
pub const API_KEY_ENV: &str = "QUILL_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// GraphQL endpoint for queries and mutations
    #[serde(default)]
    pub endpoint: String,
    /// SSE endpoint for subscriptions (defaults to `endpoint`)
    #[serde(default)]
    pub subscription_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Quiet period before a local edit is written to the backend
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound for the initial list fetch
    #[serde(default = "default_list_limit")]
    pub list_limit: u32,
    /// Wait before re-opening a dropped subscription
    #[serde(default = "default_resubscribe_delay_ms")]
    pub resubscribe_delay_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

fn default_resubscribe_delay_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            subscription_endpoint: String::new(),
            api_key: String::new(),
            debounce_ms: default_debounce_ms(),
            list_limit: default_list_limit(),
            resubscribe_delay_ms: default_resubscribe_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// `<config dir>/quill/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("quill").join("config.json"))
        .ok_or_else(|| SyncError::Config("could not determine config directory".into()))
}

impl Config {
    /// Loads the default config file, then applies environment overrides.
    pub async fn load() -> Result<Self> {
        let mut config = Self::load_from(&default_config_path()?).await?;
        config.apply_env();
        Ok(config)
    }

    /// A missing, empty or unparsable file yields the default config.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).await?;

        if content.trim().is_empty() {
            tracing::warn!("Config file {:?} is empty, using default config", path);
            return Ok(Config::default());
        }

        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config {:?} ({}), using default. File may be corrupted.",
                    path,
                    e
                );
                Ok(Config::default())
            }
        }
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, api_key: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(api_key) = api_key.filter(|v| !v.is_empty()) {
            self.api_key = api_key;
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            subscription_endpoint: self.subscription_endpoint.clone(),
            api_key: self.api_key.clone(),
            request_timeout_ms: self.request_timeout_ms,
            enable_logging: true,
            ..ClientConfig::default()
        }
    }
}
