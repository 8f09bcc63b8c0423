//! Language model trait and chat prompt types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnswerGenerationError;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The person asking questions.
    User,
    /// The model.
    Assistant,
}

/// One message of a chat prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// An instruction message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// A message from the person asking.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// An earlier model reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// An ordered list of chat messages sent to a [`LanguageModel`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prompt {
    /// Messages in the order the model reads them.
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    /// Content of the final user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.as_str())
    }
}

/// A text generation backend.
///
/// Implementations are interchangeable: the answerer only relies on
/// receiving text for a prompt.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_session::{ChatMessage, LanguageModel, Prompt};
///
/// let prompt = Prompt { messages: vec![ChatMessage::user("Say hello")] };
/// let text = model.generate(&prompt).await?;
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// The model identifier, used in logs and errors.
    fn name(&self) -> &str;

    /// Generate the assistant reply to `prompt`.
    async fn generate(&self, prompt: &Prompt) -> Result<String, AnswerGenerationError>;
}
