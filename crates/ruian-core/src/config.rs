//! Configuration management for the RUIAN widget

use crate::constants::DEBOUNCE_MS;
use crate::error::{Result, RuianError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables layered over the config file
pub const ENV_PREFIX: &str = "RUIAN";

/// Widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(alias = "apiKey", alias = "key")]
    pub api_key: String,

    #[serde(alias = "url", default = "default_base_url")]
    pub base_url: String,

    /// How long the persisted municipality catalog stays valid
    #[serde(alias = "cacheHours", default = "default_cache_retention_hours")]
    pub cache_retention_hours: u32,

    /// Drop the persisted catalog once at start-up
    #[serde(alias = "resetCache", default)]
    pub reset_cache: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://ruian.fnx.io/api/v1/ruian".to_string()
}

fn default_cache_retention_hours() -> u32 {
    24
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl WidgetConfig {
    /// Configuration with defaults for everything but the credential
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            cache_retention_hours: default_cache_retention_hours(),
            reset_cache: false,
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuianError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RuianError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Layer an optional config file (any format the `config` crate knows)
    /// under `RUIAN_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_api_key(path, None)
    }

    /// Same layering as [`WidgetConfig::load`], with an explicit credential
    /// taking precedence over file and environment
    pub fn load_with_api_key(path: Option<&Path>, api_key: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        if let Some(key) = api_key {
            builder = builder.set_override("api_key", key)?;
        }

        let settings = builder.build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(RuianError::Config("Registry API key is required".to_string()));
        }

        if self.base_url.trim().is_empty() {
            return Err(RuianError::Config("Registry base URL is required".to_string()));
        }

        if self.cache_retention_hours == 0 {
            return Err(RuianError::Config(
                "Cache retention must be at least one hour".to_string(),
            ));
        }

        Ok(())
    }

    pub fn cache_retention(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.cache_retention_hours))
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
