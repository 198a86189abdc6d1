//! HTTP DTOs for chat endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::handlers::chat::ChatReply;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to relay a message to the assistant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Message text; a missing field is forwarded as an empty string.
    #[serde(default)]
    pub message: String,

    /// Thread to continue. Absent or blank starts a new thread.
    #[serde(default)]
    pub thread_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Successful chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub thread_id: String,
    pub response: String,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            thread_id: reply.thread_id.into_inner(),
            response: reply.response,
        }
    }
}

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn timed_out() -> Self {
        Self {
            error: "Assistant response timed out.".to_string(),
        }
    }

    pub fn assistant_failed() -> Self {
        Self {
            error: "Failed to get response from Assistant".to_string(),
        }
    }
}
