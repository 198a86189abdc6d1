//! Messages on a thread and the reply assembly rule.

use serde::{Deserialize, Serialize};

/// Role of the message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person chatting through the relay.
    User,
    /// The remote assistant.
    Assistant,
}

impl MessageRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message listed from a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Who wrote the message.
    pub role: MessageRole,
    /// Primary text body of the message.
    pub text: String,
}

impl ThreadMessage {
    /// Creates a new message.
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    /// Creates an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }
}

/// Builds the reply returned to the caller.
///
/// Keeps assistant messages in list order and joins their text with newlines.
pub fn assistant_reply(messages: &[ThreadMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Assistant)
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
