use crate::adapters::sse::SseChunkStream;
use crate::domain::ports::{CompletionProvider, CompletionStream};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header, Client};
use serde::Serialize;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

/// OpenAI-compatible chat completion client.
///
/// The key is optional so a missing credential only fails the call that needs it.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn stream_completion(&self, message: &str) -> Result<CompletionStream> {
        let api_key = self.api_key.as_deref().ok_or_else(|| EtlError::MissingConfigError {
            field: "OPENAI_API_KEY".to_string(),
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: message,
            }],
            stream: true,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("Opening completion stream: {} (model {})", url, self.model);

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EtlError::LlmError {
                message: format!("HTTP {}: {}", status, error_text),
            });
        }

        Ok(SseChunkStream::new(response.bytes_stream()).boxed())
    }
}
