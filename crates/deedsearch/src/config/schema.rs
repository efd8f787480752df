use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ClientConfig::api_base`].
pub const ENV_API_BASE: &str = "DEEDSEARCH_API_BASE";

/// Environment variable overriding [`ClientConfig::auth_token`].
pub const ENV_AUTH_TOKEN: &str = "DEEDSEARCH_AUTH_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base: String,
    /// Bearer token attached to every request. Obtaining it is someone else's job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_directory: Option<PathBuf>,
}

fn default_per_page() -> u32 {
    100
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000".to_string(),
            auth_token: None,
            per_page: default_per_page(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            data_directory: None,
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory holding the durable preference database.
    ///
    /// Defaults to `~/.deedsearch/data` when not configured.
    pub fn data_directory(&self) -> Option<PathBuf> {
        self.data_directory
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".deedsearch").join("data")))
    }

    /// Applies `DEEDSEARCH_API_BASE` and `DEEDSEARCH_AUTH_TOKEN` when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Some(base) = non_empty_env(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(token) = non_empty_env(ENV_AUTH_TOKEN) {
            self.auth_token = Some(token);
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
