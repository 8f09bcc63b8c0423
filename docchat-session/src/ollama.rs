//! Ollama chat model.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::AnswerGenerationError;
use crate::model::{ChatMessage, LanguageModel, Prompt};

/// The default Ollama server address.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "mistral:instruct";

/// A [`LanguageModel`] backed by Ollama's `/api/chat` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_session::ollama::OllamaChatModel;
///
/// let model = OllamaChatModel::new("llama3.1").with_base_url("http://gpu-box:11434");
/// ```
pub struct OllamaChatModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaChatModel {
    /// Create a client for `model` on the default local server.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_URL.into(),
            model: model.into(),
        }
    }

    /// Set the server address.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn error(&self, message: String) -> AnswerGenerationError {
        AnswerGenerationError::Model { provider: format!("ollama/{}", self.model), message }
    }
}

impl Default for OllamaChatModel {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_MODEL)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[async_trait]
impl LanguageModel for OllamaChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, AnswerGenerationError> {
        debug!(
            provider = "Ollama",
            model = %self.model,
            messages = prompt.messages.len(),
            "chat request"
        );

        let request = ChatRequest { model: &self.model, messages: &prompt.messages, stream: false };
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "request failed");
                self.error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            error!(provider = "Ollama", %status, "API error");
            return Err(self.error(format!("server returned {status}: {detail}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;
        Ok(parsed.message.content)
    }
}
