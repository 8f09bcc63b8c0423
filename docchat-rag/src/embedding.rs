//! Embedding provider trait for generating vector embeddings from text.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends (Ollama, OpenAI, etc.)
/// behind a unified async interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// Vectors from different models live in unrelated spaces, so an index and
/// the questions asked against it must be embedded by providers reporting the
/// same [`model_id`](EmbeddingProvider::model_id).
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Override this method if the backend
    /// supports native batch embedding for better throughput.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identify the embedding model, e.g. `"ollama/nomic-embed-text"`.
    fn model_id(&self) -> &str;
}

/// Embed one text, failing with [`RagError::ServiceUnavailable`] after `timeout`.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>> {
    tokio::time::timeout(timeout, provider.embed(text)).await.map_err(|_| {
        warn!(provider = provider.model_id(), ?timeout, "embedding timed out");
        RagError::ServiceUnavailable { service: provider.model_id().to_string(), timeout }
    })?
}

/// Embed a batch of texts, failing with [`RagError::ServiceUnavailable`] after `timeout`.
///
/// The provider must return exactly one vector per input.
pub async fn embed_batch_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    timeout: Duration,
) -> Result<Vec<Vec<f32>>> {
    let vectors = tokio::time::timeout(timeout, provider.embed_batch(texts)).await.map_err(|_| {
        warn!(
            provider = provider.model_id(),
            batch_size = texts.len(),
            ?timeout,
            "embedding timed out"
        );
        RagError::ServiceUnavailable { service: provider.model_id().to_string(), timeout }
    })??;

    if vectors.len() != texts.len() {
        return Err(RagError::EmbeddingError {
            provider: provider.model_id().to_string(),
            message: format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
        });
    }
    Ok(vectors)
}
