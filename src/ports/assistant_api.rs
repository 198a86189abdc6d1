//! Assistant API Port - Interface to the hosted conversational-assistant service.
//!
//! The remote service owns all conversation state. The relay creates threads,
//! appends messages, starts runs, watches run status and lists the resulting
//! messages, without coupling the application layer to a specific vendor.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoAssistant;
//!
//! #[async_trait]
//! impl AssistantApi for EchoAssistant {
//!     async fn create_thread(&self) -> Result<ThreadId, AssistantApiError> {
//!         Ok(ThreadId::new("thread_1"))
//!     }
//!     // ... other methods
//! }
//! ```

use async_trait::async_trait;

use crate::domain::thread::{AssistantId, MessageRole, RunId, RunStatus, ThreadId, ThreadMessage};

/// Port for the remote assistant service.
///
/// Implementations translate between the vendor API and the thread domain.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Creates a new empty thread and returns its id.
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError>;

    /// Appends a message to a thread.
    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), AssistantApiError>;

    /// Starts a run of the given assistant over the thread.
    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<RunId, AssistantApiError>;

    /// Fetches the current status of a run.
    async fn run_status(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunStatus, AssistantApiError>;

    /// Lists the thread's messages in the order the service returns them.
    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError>;
}

/// Assistant API errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistantApiError {
    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Thread, run or assistant does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("rate limited")]
    RateLimited,

    /// Request rejected by the service.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Service returned a server error.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },
}

impl AssistantApiError {
    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if repeating the call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AssistantApiError::RateLimited
                | AssistantApiError::Unavailable(_)
                | AssistantApiError::Network(_)
                | AssistantApiError::Timeout { .. }
        )
    }
}
