//! # docchat-session
//!
//! Conversational question answering over one uploaded document per session.
//!
//! ## Overview
//!
//! - [`SessionController`] owns sessions keyed by [`SessionId`] and drives
//!   their lifecycle: `start_session` → `ingest` → `ask`… → `end_session`
//! - [`Answerer`] retrieves passages for a question, prompts a
//!   [`LanguageModel`] with the conversation so far and cites what it used
//! - [`ConversationMemory`] is the append-only turn log of a session
//! - [`TextExtractor`] turns uploaded bytes into a document
//!
//! Model backends live behind features: `ollama` ([`ollama::OllamaChatModel`])
//! and `openai` ([`openai::OpenAIChatModel`], also for Groq). PDF extraction
//! needs `pdf`.

pub mod answer;
pub mod config;
pub mod error;
pub mod extract;
pub mod memory;
pub mod model;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompt;
pub mod session;

pub use answer::{Answer, Answerer, SourceReference};
pub use config::{AnswererConfig, SessionConfig, SessionConfigBuilder};
pub use error::{AnswerGenerationError, AskError, ExtractionError, IngestError};
pub use extract::{ContentTypeExtractor, TextExtractor, Upload, content_type_for};
pub use memory::{ConversationMemory, ConversationTurn};
pub use model::{ChatMessage, LanguageModel, Prompt, Role};
pub use session::{Ready, SessionController, SessionId, SessionStatus};
