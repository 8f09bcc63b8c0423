//! OpenAI-compatible chat completions model.
//!
//! Works with OpenAI itself and with compatible hosts such as Groq.
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::AnswerGenerationError;
use crate::model::{ChatMessage, LanguageModel, Prompt};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Groq's OpenAI-compatible API base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// A [`LanguageModel`] calling `/chat/completions` on an OpenAI-compatible API.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_session::openai::{GROQ_API_BASE, OpenAIChatModel};
///
/// let model = OpenAIChatModel::new(api_key, "mixtral-8x7b-32768")?.with_api_base(GROQ_API_BASE);
/// ```
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    /// Create a client for `model` on the OpenAI API.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, AnswerGenerationError> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.is_empty() {
            return Err(AnswerGenerationError::Model {
                provider: format!("openai/{model}"),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: OPENAI_API_BASE.into(),
            model,
            temperature: None,
        })
    }

    /// Point the client at an OpenAI-compatible API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn error(&self, message: String) -> AnswerGenerationError {
        AnswerGenerationError::Model { provider: format!("openai/{}", self.model), message }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

impl CompletionResponse {
    /// Text of the first choice; `None` when it has no content.
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|choice| choice.message.content)
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, AnswerGenerationError> {
        debug!(
            provider = "OpenAI",
            model = %self.model,
            messages = prompt.messages.len(),
            "chat request"
        );

        let request = CompletionRequest {
            model: &self.model,
            messages: &prompt.messages,
            temperature: self.temperature,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                self.error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = "OpenAI", %status, "API error");
            return Err(self.error(format!("API returned {status}: {detail}")));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            self.error(format!("failed to parse response: {e}"))
        })?;

        parsed
            .into_content()
            .ok_or_else(|| self.error("response contained no message content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_content_is_read_from_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "It is 42."},
                    "finish_reason": "stop"
                }
            ]
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_content().as_deref(), Some("It is 42."));
    }

    #[test]
    fn null_content_yields_nothing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_content(), None);

        let parsed: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(parsed.into_content(), None);
    }

    #[test]
    fn request_omits_unset_temperature() {
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request =
            CompletionRequest { model: "gpt-4o-mini", messages: &messages, temperature: None };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(OpenAIChatModel::new("", "gpt-4o-mini").is_err());
    }
}
