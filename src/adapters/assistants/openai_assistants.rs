//! OpenAI Assistants client - Implementation of AssistantApi for the
//! OpenAI Assistants v2 REST API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiAssistantsConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let client = OpenAiAssistantsClient::new(config)?;
//! ```
//!
//! Every request carries the `OpenAI-Beta: assistants=v2` header.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::thread::{AssistantId, MessageRole, RunId, RunStatus, ThreadId, ThreadMessage};
use crate::ports::{AssistantApi, AssistantApiError};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

/// Configuration for the OpenAI Assistants client.
#[derive(Debug, Clone)]
pub struct OpenAiAssistantsConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAiAssistantsConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI Assistants API client.
#[derive(Debug, Clone)]
pub struct OpenAiAssistantsClient {
    config: OpenAiAssistantsConfig,
    client: Client,
}

impl OpenAiAssistantsClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiAssistantsConfig) -> Result<Self, AssistantApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.config.api_key())
            .header(BETA_HEADER, BETA_VALUE)
    }

    /// Sends a request, mapping transport failures.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, AssistantApiError> {
        self.authorized(builder).send().await.map_err(|e| {
            if e.is_timeout() {
                AssistantApiError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else if e.is_connect() {
                AssistantApiError::network(format!("Connection failed: {}", e))
            } else {
                AssistantApiError::network(e.to_string())
            }
        })
    }

    /// Sends a request and decodes a successful JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, AssistantApiError> {
        let response = self.send(builder).await?;
        let response = Self::handle_response_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| AssistantApiError::parse(format!("Failed to parse response: {}", e)))
    }

    /// Maps non-success statuses to port errors.
    async fn handle_response_status(response: Response) -> Result<Response, AssistantApiError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        let message = Self::error_message(&error_body);

        match status.as_u16() {
            401 => Err(AssistantApiError::AuthenticationFailed),
            404 => Err(AssistantApiError::not_found(message)),
            429 => Err(AssistantApiError::RateLimited),
            400 | 422 => Err(AssistantApiError::invalid_request(message)),
            500..=599 => Err(AssistantApiError::unavailable(format!(
                "Server error {}: {}",
                status, message
            ))),
            _ => Err(AssistantApiError::network(format!(
                "Unexpected status {}: {}",
                status, message
            ))),
        }
    }

    /// Extracts `error.message` from an API error body, falling back to the raw body.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| body.to_string())
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistantsClient {
    async fn create_thread(&self) -> Result<ThreadId, AssistantApiError> {
        let thread: ThreadObject = self
            .send_json(
                self.client
                    .post(self.url("/threads"))
                    .json(&serde_json::json!({})),
            )
            .await?;

        tracing::debug!(thread_id = %thread.id, "Created thread");
        Ok(ThreadId::new(thread.id))
    }

    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), AssistantApiError> {
        let body = CreateMessageRequest {
            role: role.as_str(),
            content: text,
        };
        let _: MessageObject = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/messages", thread_id)))
                    .json(&body),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<RunId, AssistantApiError> {
        let body = CreateRunRequest {
            assistant_id: assistant_id.as_str(),
        };
        let run: RunObject = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/runs", thread_id)))
                    .json(&body),
            )
            .await?;

        tracing::debug!(thread_id = %thread_id, run_id = %run.id, status = %run.status, "Started run");
        Ok(RunId::new(run.id))
    }

    async fn run_status(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<RunStatus, AssistantApiError> {
        let run: RunObject = self
            .send_json(
                self.client
                    .get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))),
            )
            .await?;
        Ok(run.status)
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
    ) -> Result<Vec<ThreadMessage>, AssistantApiError> {
        let list: MessageList = self
            .send_json(
                self.client
                    .get(self.url(&format!("/threads/{}/messages", thread_id))),
            )
            .await?;

        Ok(list.data.into_iter().map(MessageObject::into_thread_message).collect())
    }
}

// ----- OpenAI Assistants API Types -----

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: MessageRole,
    #[serde(default)]
    content: Vec<ContentPart>,
}

impl MessageObject {
    /// Uses the first text part as the message body.
    fn into_thread_message(self) -> ThreadMessage {
        let text = self
            .content
            .into_iter()
            .find_map(|part| match part {
                ContentPart::Text { text } => Some(text.value),
                ContentPart::Other => None,
            })
            .unwrap_or_default();
        ThreadMessage::new(self.role, text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text {
        text: TextValue,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
