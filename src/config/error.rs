//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),

    #[error("Invalid assistant API base URL")]
    InvalidBaseUrl,

    #[error("Invalid assistant API request timeout")]
    InvalidTimeout,

    #[error("Polling delays must be greater than zero")]
    InvalidPollingDelay,

    #[error("Polling max_delay_ms must not be below base_delay_ms")]
    InvalidPollingCap,

    #[error("Polling max_retries must be greater than zero")]
    InvalidPollingRetries,

    #[error("Polling max_wait_ms must be greater than zero")]
    InvalidPollingBudget,
}
