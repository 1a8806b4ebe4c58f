use crate::config::UpstreamConfig;
use crate::domain::ports::{ChatMessage, CompletionClient, CompletionReply};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// reqwest-backed client for an OpenAI-style `chat/completions` endpoint.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    config: UpstreamConfig,
}

impl HttpCompletionClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<CompletionReply> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: &messages,
        };

        tracing::debug!("Making API request to: {}", self.config.endpoint);
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let body = response.text().await?;

        Ok(CompletionReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
