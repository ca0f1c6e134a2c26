//! Client configuration for the first-party API, the external board service
//! and the synchronization loop.

use crate::error::{PlanitError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credentials and endpoint for the external board service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    pub api_key: String,
    pub token: String,
    #[serde(default = "TrelloConfig::default_base_url")]
    pub base_url: String,
    /// Request timeout; none when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl TrelloConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.trello.com/1";

    fn default_base_url() -> String {
        Self::DEFAULT_BASE_URL.to_string()
    }

    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
            base_url: Self::default_base_url(),
            timeout_secs: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reads `TRELLO_API_KEY`, `TRELLO_TOKEN` and optionally `TRELLO_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = required_env("TRELLO_API_KEY")?;
        let token = required_env("TRELLO_TOKEN")?;
        let mut config = Self::new(api_key, token);
        if let Ok(base_url) = std::env::var("TRELLO_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Endpoint of the first-party board and auth API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: None,
        }
    }

    /// Reads `PLANIT_API_BASE`, falling back to the local development server
    pub fn from_env() -> Self {
        std::env::var("PLANIT_API_BASE")
            .map(Self::new)
            .unwrap_or_default()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

/// Timing for cached reads and background refetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    pub poll_interval_secs: u64,
    pub board_graph_stale_secs: u64,
    pub board_list_stale_secs: u64,
}

impl SyncSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn board_graph_stale_time(&self) -> Duration {
        Duration::from_secs(self.board_graph_stale_secs)
    }

    pub fn board_list_stale_time(&self) -> Duration {
        Duration::from_secs(self.board_list_stale_secs)
    }

    /// Rejects settings that cannot drive a poller, e.g. a zero interval
    /// loaded from a config file
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(PlanitError::ConfigError(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates settings from JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overridden by `PLANIT_POLL_INTERVAL_SECS` when set
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Ok(raw) = std::env::var("PLANIT_POLL_INTERVAL_SECS") {
            settings.poll_interval_secs = raw.parse().map_err(|_| {
                PlanitError::ConfigError(format!("Invalid PLANIT_POLL_INTERVAL_SECS: {}", raw))
            })?;
        }
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            board_graph_stale_secs: 2 * 60,
            board_list_stale_secs: 5 * 60,
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PlanitError::ConfigError(format!("{} is not set", name))),
    }
}
