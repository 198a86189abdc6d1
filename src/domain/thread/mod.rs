//! Thread domain: identifiers, run statuses and messages of a remote
//! assistant conversation.

mod ids;
mod message;
mod run_status;

pub use ids::{AssistantId, RunId, ThreadId};
pub use message::{assistant_reply, MessageRole, ThreadMessage};
pub use run_status::RunStatus;
