//! HTTP handlers for chat endpoints.
//!
//! These handlers connect Axum routes to the SendChatMessage handler.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::chat::{
    SendChatMessageCommand, SendChatMessageError, SendChatMessageHandler,
};
use crate::domain::thread::ThreadId;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub handler: Arc<SendChatMessageHandler>,
}

impl ChatAppState {
    /// Creates a new ChatAppState.
    pub fn new(handler: SendChatMessageHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat - Relay a message to the assistant and return its reply.
///
/// # Errors
/// - 408 Request Timeout: The run did not complete within the polling budget
/// - 500 Internal Server Error: Any remote failure or failed run
pub async fn post_chat(
    State(state): State<ChatAppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ChatApiError> {
    let mut cmd = SendChatMessageCommand::new(req.message);
    if let Some(thread_id) = ThreadId::from_optional(req.thread_id) {
        cmd = cmd.in_thread(thread_id);
    }

    let reply = state.handler.handle(cmd).await?;

    Ok((StatusCode::OK, Json(ChatResponse::from(reply))))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub enum ChatApiError {
    TimedOut(String),
    Internal(String),
}

impl From<SendChatMessageError> for ChatApiError {
    fn from(err: SendChatMessageError) -> Self {
        match err {
            SendChatMessageError::TimedOut { .. } => ChatApiError::TimedOut(err.to_string()),
            other => ChatApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ChatApiError::TimedOut(msg) => {
                tracing::warn!("Assistant timed out: {}", msg);
                (StatusCode::REQUEST_TIMEOUT, ErrorResponse::timed_out())
            }
            ChatApiError::Internal(msg) => {
                tracing::error!("Error communicating with Assistant: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::assistant_failed())
            }
        };

        (status, Json(error)).into_response()
    }
}
