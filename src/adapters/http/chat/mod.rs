//! HTTP adapter for the chat relay endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse};
pub use handlers::{health, post_chat, ChatApiError, ChatAppState};
pub use routes::{chat_router, chat_routes, cors_layer};
