//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `assistants` - Assistant API clients (OpenAI, mock)
//! - `http` - Axum routes exposing the relay

pub mod assistants;
pub mod http;

pub use assistants::{MockAssistantApi, OpenAiAssistantsClient, OpenAiAssistantsConfig};
