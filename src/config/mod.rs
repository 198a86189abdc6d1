//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ASSISTANT_RELAY` prefix and nested values use double underscores as separators.
//!
//! The plain `OPENAI_API_KEY` and `ASSISTANT_ID` variables are accepted as
//! defaults for the assistant section; prefixed variables take precedence.
//!
//! # Example
//!
//! ```no_run
//! use assistant_relay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod assistant;
mod error;
mod polling;
mod server;

pub use assistant::AssistantConfig;
pub use error::{ConfigError, ValidationError};
pub use polling::{PollingConfig, PollingStrategy, PollingVerbosity};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Unprefixed variables and the keys they provide defaults for.
const PLAIN_ENV_DEFAULTS: [(&str, &str); 2] = [
    ("OPENAI_API_KEY", "assistant.openai_api_key"),
    ("ASSISTANT_ID", "assistant.assistant_id"),
];

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote assistant service configuration
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Completion polling configuration
    #[serde(default)]
    pub polling: PollingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Uses `OPENAI_API_KEY` and `ASSISTANT_ID` as defaults when set
    /// 3. Reads environment variables with `ASSISTANT_RELAY` prefix
    /// 4. Uses `__` (double underscore) to separate nested values
    /// 5. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ASSISTANT_RELAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ASSISTANT_RELAY__POLLING__STRATEGY=fixed_interval` -> `polling.strategy`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        for (var, key) in PLAIN_ENV_DEFAULTS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("ASSISTANT_RELAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.assistant.validate()?;
        self.polling.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
