//! Mock Assistant API for testing.
//!
//! Provides a scripted implementation of the AssistantApi port so handlers,
//! the completion poller and the HTTP layer can be exercised without calling
//! the real service.
//!
//! # Features
//!
//! - Scripted thread and run ids (minted when the script runs out)
//! - Scripted run status sequence with a fallback status
//! - Error injection per operation
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let api = MockAssistantApi::new()
//!     .with_thread_id("c1")
//!     .with_run_id("r1")
//!     .with_statuses([RunStatus::Queued, RunStatus::Completed])
//!     .with_message(ThreadMessage::assistant("hi"));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::thread::{AssistantId, MessageRole, RunId, RunStatus, ThreadId, ThreadMessage};
use crate::ports::{AssistantApi, AssistantApiError};

/// Operations of the AssistantApi port, used for error injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    CreateThread,
    AddMessage,
    CreateRun,
    RunStatus,
    ListMessages,
}

/// A recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateThread,
    AddMessage {
        thread_id: ThreadId,
        role: MessageRole,
        text: String,
    },
    CreateRun {
        thread_id: ThreadId,
        assistant_id: AssistantId,
    },
    RunStatus {
        thread_id: ThreadId,
        run_id: RunId,
    },
    ListMessages {
        thread_id: ThreadId,
    },
}

/// One scripted answer to a run status check.
#[derive(Debug, Clone)]
pub enum MockStatus {
    /// Report this status.
    Status(RunStatus),
    /// Fail the check with this error.
    Error(AssistantApiError),
}

#[derive(Debug)]
struct MockState {
    thread_ids: VecDeque<ThreadId>,
    run_ids: VecDeque<RunId>,
    statuses: VecDeque<MockStatus>,
    fallback_status: RunStatus,
    messages: Vec<ThreadMessage>,
    failures: HashMap<MockOperation, AssistantApiError>,
    calls: Vec<MockCall>,
}

/// Mock assistant API for testing.
#[derive(Debug, Clone)]
pub struct MockAssistantApi {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockAssistantApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssistantApi {
    /// Creates a mock whose runs complete on the first check.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                thread_ids: VecDeque::new(),
                run_ids: VecDeque::new(),
                statuses: VecDeque::new(),
                fallback_status: RunStatus::Completed,
                messages: Vec::new(),
                failures: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// Queues the id returned by the next `create_thread`.
    pub fn with_thread_id(self, id: impl Into<String>) -> Self {
        self.state.lock().unwrap().thread_ids.push_back(ThreadId::new(id));
        self
    }

    /// Queues the id returned by the next `create_run`.
    pub fn with_run_id(self, id: impl Into<String>) -> Self {
        self.state.lock().unwrap().run_ids.push_back(RunId::new(id));
        self
    }

    /// Queues statuses reported by successive `run_status` calls.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        let mut state = self.state.lock().unwrap();
        state
            .statuses
            .extend(statuses.into_iter().map(MockStatus::Status));
        drop(state);
        self
    }

    /// Queues a failing `run_status` call.
    pub fn with_status_error(self, error: AssistantApiError) -> Self {
        self.state
            .lock()
            .unwrap()
            .statuses
            .push_back(MockStatus::Error(error));
        self
    }

    /// Sets the status reported once the scripted statuses are used up.
    pub fn with_fallback_status(self, status: RunStatus) -> Self {
        self.state.lock().unwrap().fallback_status = status;
        self
    }

    /// Adds a message returned by `list_messages`.
    pub fn with_message(self, message: ThreadMessage) -> Self {
        self.state.lock().unwrap().messages.push(message);
        self
    }

    /// Makes every call to `operation` fail with `error`.
    pub fn failing_on(self, operation: MockOperation, error: AssistantApiError) -> Self {
        self.state.lock().unwrap().failures.insert(operation, error);
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the number of `create_thread` calls made.
    pub fn threads_created(&self) -> usize {
        self.count(|c| matches!(c, MockCall::CreateThread))
    }

    /// Returns the number of `run_status` calls made.
    pub fn status_checks(&self) -> usize {
        self.count(|c| matches!(c, MockCall::RunStatus { .. }))
    }

    fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    /// Records the call and returns the injected failure, if any.
    fn record(&self, operation: MockOperation, call: MockCall) -> Result<(), AssistantApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssistantApi for MockAssistantApi {
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError> {
        self.record(MockOperation::CreateThread, MockCall::CreateThread)?;
        let next = self.state.lock().unwrap().thread_ids.pop_front();
        Ok(next.unwrap_or_else(|| ThreadId::new(format!("thread_{}", Uuid::new_v4().simple()))))
    }

    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), AssistantApiError> {
        self.record(
            MockOperation::AddMessage,
            MockCall::AddMessage {
                thread_id: thread_id.clone(),
                role,
                text: text.to_string(),
            },
        )
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<RunId, AssistantApiError> {
        self.record(
            MockOperation::CreateRun,
            MockCall::CreateRun {
                thread_id: thread_id.clone(),
                assistant_id: assistant_id.clone(),
            },
        )?;
        let next = self.state.lock().unwrap().run_ids.pop_front();
        Ok(next.unwrap_or_else(|| RunId::new(format!("run_{}", Uuid::new_v4().simple()))))
    }

    async fn run_status(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunStatus, AssistantApiError> {
        self.record(
            MockOperation::RunStatus,
            MockCall::RunStatus {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            },
        )?;
        let mut state = self.state.lock().unwrap();
        match state.statuses.pop_front() {
            Some(MockStatus::Status(status)) => Ok(status),
            Some(MockStatus::Error(err)) => Err(err),
            None => Ok(state.fallback_status),
        }
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError> {
        self.record(
            MockOperation::ListMessages,
            MockCall::ListMessages {
                thread_id: thread_id.clone(),
            },
        )?;
        Ok(self.state.lock().unwrap().messages.clone())
    }
}
