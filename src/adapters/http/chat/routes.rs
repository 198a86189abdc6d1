//! Axum routes for chat endpoints.

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health, post_chat, ChatAppState};

/// Creates routes for chat endpoints.
///
/// REST Endpoints:
/// - POST /chat - Relay a message to the assistant
/// - GET /health - Liveness probe
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(post_chat))
        .route("/health", get(health))
}

/// CORS layer for the given allow-list; an empty list permits any origin.
pub fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Complete application router with CORS and request tracing.
pub fn chat_router(state: ChatAppState, cors_origins: Vec<HeaderValue>) -> Router {
    chat_routes()
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
