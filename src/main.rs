//! Assistant Relay server binary.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use assistant_relay::adapters::http::{chat_router, ChatAppState};
use assistant_relay::adapters::{OpenAiAssistantsClient, OpenAiAssistantsConfig};
use assistant_relay::application::SendChatMessageHandler;
use assistant_relay::config::{AppConfig, ValidationError};
use assistant_relay::domain::thread::AssistantId;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let api_key = config
        .assistant
        .openai_api_key
        .clone()
        .ok_or(ValidationError::MissingRequired("OPENAI_API_KEY"))?;
    let assistant_id = config
        .assistant
        .assistant_id
        .clone()
        .ok_or(ValidationError::MissingRequired("ASSISTANT_ID"))?;

    let client = OpenAiAssistantsClient::new(
        OpenAiAssistantsConfig::new(api_key)
            .with_base_url(config.assistant.base_url.clone())
            .with_timeout(config.assistant.timeout()),
    )?;

    let handler = SendChatMessageHandler::new(
        Arc::new(client),
        AssistantId::new(assistant_id),
        config.polling.to_poller_config(),
    );
    let app = chat_router(
        ChatAppState::new(handler),
        config.server.cors_header_values()?,
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        environment = ?config.server.environment,
        "Server is running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
