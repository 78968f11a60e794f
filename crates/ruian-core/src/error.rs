//! Error types for the RUIAN widget

use thiserror::Error;

/// Main error type for registry, cache and configuration operations
#[derive(Error, Debug)]
pub enum RuianError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Registry credential is missing")]
    MissingCredential,

    #[error("Registry returned HTTP {status} for {endpoint}")]
    RegistryStatus { endpoint: String, status: u16 },

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Result type for RUIAN operations
pub type Result<T> = std::result::Result<T, RuianError>;
