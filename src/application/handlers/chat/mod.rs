//! Chat handlers: relaying a message and waiting for the run to complete.

mod completion_poller;
mod send_chat_message;

pub use completion_poller::{
    backoff_delay, CompletionPoller, PollOutcome, PollStrategy, PollVerbosity, PollerConfig,
};
pub use send_chat_message::{
    ChatReply, SendChatMessageCommand, SendChatMessageError, SendChatMessageHandler,
};
