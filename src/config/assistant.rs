//! Assistant service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Remote assistant service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Assistant persona that executes every run
    pub assistant_id: Option<String>,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AssistantConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Check if an assistant id is configured
    pub fn has_assistant_id(&self) -> bool {
        self.assistant_id.as_ref().is_some_and(|id| !id.trim().is_empty())
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.has_assistant_id() {
            return Err(ValidationError::MissingRequired("ASSISTANT_ID"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            assistant_id: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}
