//! Assistant API Adapters.
//!
//! Implementations of the AssistantApi port.
//!
//! ## Available Adapters
//!
//! - `OpenAiAssistantsClient` - OpenAI Assistants v2 REST API
//! - `MockAssistantApi` - Scripted mock for testing

mod mock_assistant;
mod openai_assistants;

pub use mock_assistant::{MockAssistantApi, MockCall, MockOperation, MockStatus};
pub use openai_assistants::{OpenAiAssistantsClient, OpenAiAssistantsConfig};
