//! Configuration for answering and session management.

use std::time::Duration;

use docchat_rag::BuildOptions;
use serde::{Deserialize, Serialize};

/// How the answerer retrieves passages and uses conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswererConfig {
    /// Number of passages retrieved per question. Zero disables retrieval.
    pub top_k: usize,
    /// Number of most recent turns put in the prompt; `None` sends all of them.
    pub history_window: Option<usize>,
    /// Rewrite follow-up questions into standalone questions before retrieval.
    pub condense_follow_ups: bool,
}

impl Default for AnswererConfig {
    fn default() -> Self {
        Self { top_k: 4, history_window: None, condense_follow_ups: false }
    }
}

/// Configuration for a [`SessionController`](crate::SessionController).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Answerer settings shared by every session.
    pub answerer: AnswererConfig,
    /// Maximum embedding requests in flight while indexing.
    pub embed_concurrency: usize,
    /// Chunk texts per embedding request while indexing.
    pub embed_batch_size: usize,
    /// Deadline for each embedding request.
    pub embedding_timeout: Duration,
    /// Deadline for each language model call.
    pub generation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            answerer: AnswererConfig::default(),
            embed_concurrency: 8,
            embed_batch_size: 16,
            embedding_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(120),
        }
    }
}

impl SessionConfig {
    /// Create a new builder for constructing a [`SessionConfig`].
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Index build options derived from this config.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            concurrency: self.embed_concurrency,
            batch_size: self.embed_batch_size,
            timeout: self.embedding_timeout,
        }
    }
}

/// Builder for constructing a [`SessionConfig`].
///
/// Zero concurrency or batch size is raised to one.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the number of passages retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.answerer.top_k = k;
        self
    }

    /// Limit how many recent turns go into each prompt.
    pub fn history_window(mut self, turns: usize) -> Self {
        self.config.answerer.history_window = Some(turns);
        self
    }

    /// Enable or disable follow-up condensing before retrieval.
    pub fn condense_follow_ups(mut self, enabled: bool) -> Self {
        self.config.answerer.condense_follow_ups = enabled;
        self
    }

    /// Set the maximum number of concurrent embedding requests.
    pub fn embed_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embed_concurrency = concurrency;
        self
    }

    /// Set the number of chunk texts per embedding request.
    pub fn embed_batch_size(mut self, batch_size: usize) -> Self {
        self.config.embed_batch_size = batch_size;
        self
    }

    /// Set the per-request embedding deadline.
    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.config.embedding_timeout = timeout;
        self
    }

    /// Set the per-call generation deadline.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    /// Build the [`SessionConfig`].
    pub fn build(mut self) -> SessionConfig {
        self.config.embed_concurrency = self.config.embed_concurrency.max(1);
        self.config.embed_batch_size = self.config.embed_batch_size.max(1);
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_answerer_fields() {
        let config =
            SessionConfig::builder().top_k(2).history_window(3).condense_follow_ups(true).build();
        assert_eq!(
            config.answerer,
            AnswererConfig { top_k: 2, history_window: Some(3), condense_follow_ups: true }
        );
    }

    #[test]
    fn zero_parallelism_is_raised_to_one() {
        let config = SessionConfig::builder().embed_concurrency(0).embed_batch_size(0).build();
        assert_eq!(config.build_options().concurrency, 1);
        assert_eq!(config.build_options().batch_size, 1);
    }
}
