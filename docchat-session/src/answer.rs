//! Retrieval-augmented answering.
//!
//! [`Answerer::answer`] runs the steps of one question in order:
//!
//! 1. optionally condense a follow-up into a standalone question
//! 2. embed it with the embedder that built the index
//! 3. retrieve the top-k passages
//! 4. prompt the language model with history, passages and question
//! 5. append the turn to memory
//!
//! Nothing is written to memory unless every step succeeds.

use std::sync::Arc;
use std::time::Duration;

use docchat_rag::{EmbeddingProvider, SearchResult, VectorIndex, embed_with_timeout};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnswererConfig;
use crate::error::{AnswerGenerationError, AskError, Result};
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::model::{LanguageModel, Prompt};
use crate::prompt::{answer_prompt, condense_prompt};

/// A passage cited by an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceReference {
    /// Per-answer label, `source_0`, `source_1`, … in retrieval order.
    pub label: String,
    /// The chunk's own label from chunking, e.g. `"7-pl"`.
    pub chunk_label: String,
    /// The passage text.
    pub text: String,
    /// Similarity to the question.
    pub score: f32,
}

impl SourceReference {
    fn from_result(position: usize, result: SearchResult) -> Self {
        Self {
            label: format!("source_{position}"),
            chunk_label: result.chunk.label,
            text: result.chunk.text,
            score: result.score,
        }
    }
}

/// An answer and the passages it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated answer text.
    pub text: String,
    /// Cited passages in retrieval order; empty when nothing was retrieved.
    pub sources: Vec<SourceReference>,
}

impl Answer {
    /// Whether any passage was cited.
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// `Sources: source_0, source_1` or `No sources found.`.
    pub fn sources_note(&self) -> String {
        if self.sources.is_empty() {
            return "No sources found.".to_string();
        }
        let labels: Vec<&str> = self.sources.iter().map(|s| s.label.as_str()).collect();
        format!("Sources: {}", labels.join(", "))
    }

    /// The answer text followed by the sources note on its own line.
    pub fn rendered(&self) -> String {
        format!("{}\n{}", self.text, self.sources_note())
    }
}

/// Answers questions against one index using one embedder and one model.
pub struct Answerer {
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    config: AnswererConfig,
    embedding_timeout: Duration,
    generation_timeout: Duration,
}

impl Answerer {
    /// Create an answerer with the default 30 s embedding and 120 s generation deadlines.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
        config: AnswererConfig,
    ) -> Self {
        Self {
            embedder,
            model,
            config,
            embedding_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
        }
    }

    /// Override the embedding and generation deadlines.
    pub fn with_timeouts(mut self, embedding: Duration, generation: Duration) -> Self {
        self.embedding_timeout = embedding;
        self.generation_timeout = generation;
        self
    }

    /// The retrieval and history settings in use.
    pub fn config(&self) -> &AnswererConfig {
        &self.config
    }

    /// Answer `question` from `index`, then record the turn in `memory`.
    ///
    /// The history used for this question never contains the question itself.
    ///
    /// # Errors
    ///
    /// - [`AskError::EmbeddingModelMismatch`] if `index` was built by another embedding model
    /// - [`AskError::Retrieval`] if embedding the question or querying fails
    /// - [`AskError::AnswerGeneration`] if the model fails or times out
    ///
    /// `memory` is unchanged on every error path.
    pub async fn answer(
        &self,
        question: &str,
        memory: &mut ConversationMemory,
        index: &dyn VectorIndex,
    ) -> Result<Answer> {
        if index.embedding_model() != self.embedder.model_id() {
            return Err(AskError::EmbeddingModelMismatch {
                index_model: index.embedding_model().to_string(),
                question_model: self.embedder.model_id().to_string(),
            });
        }

        let history = memory.recent(self.config.history_window);
        let retrieval_query = self.retrieval_query(question, history).await?;

        let results = if self.config.top_k == 0 || index.is_empty() {
            Vec::new()
        } else {
            let embedding =
                embed_with_timeout(self.embedder.as_ref(), &retrieval_query, self.embedding_timeout)
                    .await?;
            index.query(&embedding, self.config.top_k).await?
        };
        let sources: Vec<SourceReference> = results
            .into_iter()
            .enumerate()
            .map(|(position, result)| SourceReference::from_result(position, result))
            .collect();
        debug!(source_count = sources.len(), history_turns = history.len(), "retrieved passages");

        let prompt = answer_prompt(history, &sources, question);
        let text = self.generate(&prompt).await?;

        memory.append(ConversationTurn::new(question, text.as_str()));
        info!(
            model = self.model.name(),
            source_count = sources.len(),
            turns = memory.len(),
            "answered question"
        );

        Ok(Answer { text, sources })
    }

    /// The text to embed for retrieval: the question, or its standalone rewrite.
    async fn retrieval_query(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String> {
        if !self.config.condense_follow_ups || history.is_empty() {
            return Ok(question.to_string());
        }
        let rewritten = self.generate(&condense_prompt(history, question)).await?;
        if rewritten.is_empty() {
            warn!(
                model = self.model.name(),
                "condensing returned nothing, retrieving with original question"
            );
            return Ok(question.to_string());
        }
        debug!(standalone = %rewritten, "condensed follow-up question");
        Ok(rewritten)
    }

    async fn generate(
        &self,
        prompt: &Prompt,
    ) -> std::result::Result<String, AnswerGenerationError> {
        let timeout = self.generation_timeout;
        let text = tokio::time::timeout(timeout, self.model.generate(prompt)).await.map_err(|_| {
            warn!(model = self.model.name(), ?timeout, "generation timed out");
            AnswerGenerationError::ServiceUnavailable {
                provider: self.model.name().to_string(),
                timeout,
            }
        })??;
        Ok(text.trim().to_string())
    }
}
