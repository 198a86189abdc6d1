//! Completion polling configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::handlers::chat::{PollStrategy, PollVerbosity, PollerConfig};

/// Polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Polling strategy
    #[serde(default)]
    pub strategy: PollingStrategy,

    /// Delay before the first status check (exponential backoff)
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound for a single delay (exponential backoff)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Maximum number of status checks (exponential backoff)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wall-clock budget for one run (exponential backoff)
    #[serde(default = "default_max_wait")]
    pub max_wait_ms: u64,

    /// Delay between status checks (fixed interval)
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Log level for individual status checks
    #[serde(default)]
    pub verbosity: PollingVerbosity,

    /// End polling when the run fails, is cancelled or expires
    #[serde(default = "default_stop_on_terminal_failure")]
    pub stop_on_terminal_failure: bool,
}

/// Polling strategy name
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PollingStrategy {
    #[default]
    ExponentialBackoff,
    FixedInterval,
}

/// Status check logging verbosity
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PollingVerbosity {
    #[default]
    Quiet,
    Verbose,
}

impl PollingConfig {
    /// Builds the poller configuration
    pub fn to_poller_config(&self) -> PollerConfig {
        let strategy = match self.strategy {
            PollingStrategy::ExponentialBackoff => PollStrategy::ExponentialBackoff {
                base_delay: Duration::from_millis(self.base_delay_ms),
                max_delay: Duration::from_millis(self.max_delay_ms),
                max_retries: self.max_retries,
                max_wait: Duration::from_millis(self.max_wait_ms),
            },
            PollingStrategy::FixedInterval => PollStrategy::FixedInterval {
                interval: Duration::from_millis(self.interval_ms),
            },
        };
        let verbosity = match self.verbosity {
            PollingVerbosity::Quiet => PollVerbosity::Quiet,
            PollingVerbosity::Verbose => PollVerbosity::Verbose,
        };

        PollerConfig::default()
            .with_strategy(strategy)
            .with_verbosity(verbosity)
            .with_stop_on_terminal_failure(self.stop_on_terminal_failure)
    }

    /// Validate polling configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.strategy {
            PollingStrategy::ExponentialBackoff => {
                if self.base_delay_ms == 0 {
                    return Err(ValidationError::InvalidPollingDelay);
                }
                if self.max_delay_ms < self.base_delay_ms {
                    return Err(ValidationError::InvalidPollingCap);
                }
                if self.max_retries == 0 {
                    return Err(ValidationError::InvalidPollingRetries);
                }
                if self.max_wait_ms == 0 {
                    return Err(ValidationError::InvalidPollingBudget);
                }
            }
            PollingStrategy::FixedInterval => {
                if self.interval_ms == 0 {
                    return Err(ValidationError::InvalidPollingDelay);
                }
            }
        }
        Ok(())
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            strategy: PollingStrategy::default(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_retries: default_max_retries(),
            max_wait_ms: default_max_wait(),
            interval_ms: default_interval(),
            verbosity: PollingVerbosity::default(),
            stop_on_terminal_failure: default_stop_on_terminal_failure(),
        }
    }
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    15000
}

fn default_max_retries() -> u32 {
    10
}

fn default_max_wait() -> u64 {
    60000
}

fn default_interval() -> u64 {
    500
}

fn default_stop_on_terminal_failure() -> bool {
    true
}
