//! SendChatMessage command handler.
//!
//! Relays one user message to the remote assistant and returns its reply:
//! ensure a thread exists, append the message, start a run, wait for it to
//! complete, then collect the assistant's messages.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::thread::{assistant_reply, AssistantId, MessageRole, RunStatus, ThreadId};
use crate::ports::{AssistantApi, AssistantApiError};

use super::completion_poller::{CompletionPoller, PollOutcome, PollerConfig};

/// Command to relay a chat message.
#[derive(Debug, Clone)]
pub struct SendChatMessageCommand {
    /// Message text, forwarded as-is.
    pub message: String,
    /// Thread to continue; a new one is created when absent.
    pub thread_id: Option<ThreadId>,
}

impl SendChatMessageCommand {
    /// Creates a command that starts a new thread.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: None,
        }
    }

    /// Continues an existing thread.
    pub fn in_thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }
}

/// The assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Thread the exchange happened on.
    pub thread_id: ThreadId,
    /// Assistant messages joined with newlines.
    pub response: String,
}

/// Errors that can occur when relaying a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendChatMessageError {
    /// The run did not complete within the polling budget.
    #[error("assistant response timed out after {attempts} status checks")]
    TimedOut { attempts: u32 },

    /// The run reached a terminal status other than completed.
    #[error("assistant run ended with status {status}")]
    RunEnded { status: RunStatus },

    /// The remote service failed.
    #[error("assistant API error: {0}")]
    Api(#[from] AssistantApiError),
}

/// Handler for SendChatMessage commands.
#[derive(Clone)]
pub struct SendChatMessageHandler {
    api: Arc<dyn AssistantApi>,
    poller: CompletionPoller,
    assistant_id: AssistantId,
}

impl SendChatMessageHandler {
    /// Creates a new handler with the given dependencies.
    pub fn new(
        api: Arc<dyn AssistantApi>,
        assistant_id: AssistantId,
        poller_config: PollerConfig,
    ) -> Self {
        let poller = CompletionPoller::new(Arc::clone(&api), poller_config);
        Self {
            api,
            poller,
            assistant_id,
        }
    }

    /// Handles a send chat message command.
    pub async fn handle(
        &self,
        cmd: SendChatMessageCommand,
    ) -> Result<ChatReply, SendChatMessageError> {
        let thread_id = match cmd.thread_id {
            Some(id) => id,
            None => {
                let id = self.api.create_thread().await?;
                tracing::info!(thread_id = %id, "Created new thread");
                id
            }
        };

        self.api
            .add_message(&thread_id, MessageRole::User, &cmd.message)
            .await?;

        let run_id = self.api.create_run(&thread_id, &self.assistant_id).await?;

        match self.poller.poll(&thread_id, &run_id).await {
            PollOutcome::Completed { .. } => {}
            PollOutcome::TimedOut { attempts, .. } | PollOutcome::RetriesExhausted { attempts } => {
                return Err(SendChatMessageError::TimedOut { attempts });
            }
            PollOutcome::RunEnded { status, .. } => {
                return Err(SendChatMessageError::RunEnded { status });
            }
            PollOutcome::Failed { error, .. } => {
                return Err(SendChatMessageError::Api(error));
            }
        }

        let messages = self.api.list_messages(&thread_id).await?;
        let response = assistant_reply(&messages);

        Ok(ChatReply {
            thread_id,
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::assistants::{MockAssistantApi, MockCall, MockOperation};
    use crate::application::handlers::chat::PollStrategy;
    use crate::domain::thread::{RunId, ThreadMessage};
    use std::time::Duration;

    fn handler(api: &MockAssistantApi) -> SendChatMessageHandler {
        SendChatMessageHandler::new(
            Arc::new(api.clone()),
            AssistantId::new("asst_test"),
            PollerConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn new_conversation_end_to_end() {
        let api = MockAssistantApi::new()
            .with_thread_id("c1")
            .with_run_id("r1")
            .with_statuses([RunStatus::Queued, RunStatus::Completed])
            .with_message(ThreadMessage::assistant("hi"));

        let reply = handler(&api)
            .handle(SendChatMessageCommand::new("hello"))
            .await
            .unwrap();

        assert_eq!(
            reply,
            ChatReply {
                thread_id: ThreadId::new("c1"),
                response: "hi".to_string(),
            }
        );

        let thread = ThreadId::new("c1");
        let run = RunId::new("r1");
        assert_eq!(
            api.calls(),
            vec![
                MockCall::CreateThread,
                MockCall::AddMessage {
                    thread_id: thread.clone(),
                    role: MessageRole::User,
                    text: "hello".to_string(),
                },
                MockCall::CreateRun {
                    thread_id: thread.clone(),
                    assistant_id: AssistantId::new("asst_test"),
                },
                MockCall::RunStatus {
                    thread_id: thread.clone(),
                    run_id: run.clone(),
                },
                MockCall::RunStatus {
                    thread_id: thread.clone(),
                    run_id: run,
                },
                MockCall::ListMessages { thread_id: thread },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn existing_thread_is_reused() {
        let api = MockAssistantApi::new().with_message(ThreadMessage::assistant("again"));

        let reply = handler(&api)
            .handle(SendChatMessageCommand::new("more").in_thread(ThreadId::new("c9")))
            .await
            .unwrap();

        assert_eq!(reply.thread_id, ThreadId::new("c9"));
        assert_eq!(api.threads_created(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn new_threads_are_distinct() {
        let api = MockAssistantApi::new();
        let handler = handler(&api);

        let first = handler.handle(SendChatMessageCommand::new("a")).await.unwrap();
        let second = handler.handle(SendChatMessageCommand::new("b")).await.unwrap();

        assert_ne!(first.thread_id, second.thread_id);
        assert_eq!(api.threads_created(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_joins_assistant_messages_only() {
        let api = MockAssistantApi::new()
            .with_message(ThreadMessage::assistant("line one"))
            .with_message(ThreadMessage::user("hello"))
            .with_message(ThreadMessage::assistant("line two"));

        let reply = handler(&api)
            .handle(SendChatMessageCommand::new("hello"))
            .await
            .unwrap();

        assert_eq!(reply.response, "line one\nline two");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_failure_is_api_error_without_new_thread() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::AddMessage, AssistantApiError::not_found("thread c9"));

        let result = handler(&api)
            .handle(SendChatMessageCommand::new("x").in_thread(ThreadId::new("c9")))
            .await;

        assert_eq!(
            result,
            Err(SendChatMessageError::Api(AssistantApiError::not_found("thread c9")))
        );
        assert_eq!(api.threads_created(), 0);
        assert_eq!(api.status_checks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn thread_creation_failure_stops_early() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::CreateThread, AssistantApiError::AuthenticationFailed);

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(
            result,
            Err(SendChatMessageError::Api(AssistantApiError::AuthenticationFailed))
        );
        assert_eq!(api.calls(), vec![MockCall::CreateThread]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_creation_failure_is_api_error() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::CreateRun, AssistantApiError::RateLimited);

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(result, Err(SendChatMessageError::Api(AssistantApiError::RateLimited)));
    }

    #[tokio::test(start_paused = true)]
    async fn list_failure_is_api_error() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::ListMessages, AssistantApiError::unavailable("500"));

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert!(matches!(result, Err(SendChatMessageError::Api(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_skips_message_listing() {
        let api = MockAssistantApi::new().with_fallback_status(RunStatus::InProgress);

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(result, Err(SendChatMessageError::TimedOut { attempts: 8 }));
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, MockCall::ListMessages { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_is_reported_as_timeout() {
        let api = MockAssistantApi::new().with_fallback_status(RunStatus::Queued);
        let handler = SendChatMessageHandler::new(
            Arc::new(api.clone()),
            AssistantId::new("asst_test"),
            PollerConfig::default().with_strategy(PollStrategy::ExponentialBackoff {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                max_retries: 3,
                max_wait: Duration::from_secs(60),
            }),
        );

        let result = handler.handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(result, Err(SendChatMessageError::TimedOut { attempts: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_is_reported() {
        let api = MockAssistantApi::new().with_statuses([RunStatus::Cancelled]);

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(
            result,
            Err(SendChatMessageError::RunEnded {
                status: RunStatus::Cancelled
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_status_error_is_api_error() {
        let api = MockAssistantApi::new()
            .failing_on(MockOperation::RunStatus, AssistantApiError::AuthenticationFailed);

        let result = handler(&api).handle(SendChatMessageCommand::new("x")).await;

        assert_eq!(
            result,
            Err(SendChatMessageError::Api(AssistantApiError::AuthenticationFailed))
        );
        assert_eq!(api.status_checks(), 1);
        assert!(!api
            .calls()
            .iter()
            .any(|c| matches!(c, MockCall::ListMessages { .. })));
    }
}
