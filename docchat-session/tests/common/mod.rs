//! Deterministic in-process embedders and models for tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docchat_rag::{EmbeddingProvider, RagError};
use docchat_session::{AnswerGenerationError, LanguageModel, Prompt, Role};
use tokio::sync::{Notify, Semaphore};

const VOCABULARY: &[&str] =
    &["rust", "python", "ocean", "mountain", "river", "compiler", "borrow", "tide"];

/// Embeds text as vocabulary word counts plus a small constant component,
/// so related passages score higher and no vector is all zeros.
pub struct VocabEmbedder {
    model_id: String,
    down: AtomicBool,
}

impl VocabEmbedder {
    pub fn new() -> Self {
        Self::named("test/vocab")
    }

    pub fn named(model_id: &str) -> Self {
        Self { model_id: model_id.to_string(), down: AtomicBool::new(false) }
    }

    /// Make every following call fail (or succeed again).
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for VocabEmbedder {
    async fn embed(&self, text: &str) -> docchat_rag::Result<Vec<f32>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RagError::EmbeddingError {
                provider: self.model_id.clone(),
                message: "connection refused".into(),
            });
        }
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> =
            VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect();
        vector.push(0.01);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Wraps [`VocabEmbedder`] and holds every call until [`open`](Self::open).
/// `entered` fires when the first call arrives.
pub struct GatedEmbedder {
    inner: VocabEmbedder,
    gate: Semaphore,
    pub entered: Notify,
}

impl GatedEmbedder {
    pub fn new() -> Self {
        Self { inner: VocabEmbedder::new(), gate: Semaphore::new(0), entered: Notify::new() }
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

#[async_trait]
impl EmbeddingProvider for GatedEmbedder {
    async fn embed(&self, text: &str) -> docchat_rag::Result<Vec<f32>> {
        self.entered.notify_one();
        let _permit = self.gate.acquire().await.expect("gate closed");
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

/// Records every prompt and replies from a script, then with `"answer N"`.
#[derive(Default)]
pub struct RecordingModel {
    prompts: Mutex<Vec<Prompt>>,
    replies: Mutex<VecDeque<String>>,
}

impl RecordingModel {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    /// Questions of earlier turns replayed in the `n`th prompt, in order.
    pub fn history_questions(&self, n: usize) -> Vec<String> {
        let prompt = &self.prompts()[n];
        // The final user message is the current question, not history.
        let last_user = prompt.messages.iter().rposition(|m| m.role == Role::User);
        prompt
            .messages
            .iter()
            .enumerate()
            .filter(|(i, m)| m.role == Role::User && Some(*i) != last_user)
            .map(|(_, m)| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    fn name(&self) -> &str {
        "test/recording"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, AnswerGenerationError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.clone());
        let scripted = self.replies.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| format!("answer {}", prompts.len())))
    }
}

/// Fails every call.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "test/failing"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, AnswerGenerationError> {
        Err(AnswerGenerationError::Model {
            provider: "test/failing".into(),
            message: "boom".into(),
        })
    }
}

/// Signals `started` and then never answers.
#[derive(Default)]
pub struct HangingModel {
    pub started: Arc<Notify>,
}

#[async_trait]
impl LanguageModel for HangingModel {
    fn name(&self) -> &str {
        "test/hanging"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, AnswerGenerationError> {
        self.started.notify_one();
        std::future::pending().await
    }
}

/// A document whose paragraphs each talk about one topic.
pub fn topic_document() -> String {
    [
        "Rust is a systems language. The rust compiler enforces borrow rules.",
        "The ocean has a daily tide. Ocean water is salty.",
        "A mountain river flows fast. The river carves the mountain.",
    ]
    .join("\n\n")
}
