//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application layer and the outside world. Adapters implement these ports.
//!
//! - `AssistantApi` - the hosted assistant service (threads, messages, runs)

mod assistant_api;

pub use assistant_api::{AssistantApi, AssistantApiError};
