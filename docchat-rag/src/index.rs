//! Vector index trait for similarity search over a document's chunks.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A read-only index of embedded chunks supporting top-k similarity search.
///
/// An index is built once from the complete chunk set of one document and
/// never changes afterwards; there is no insert or delete.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let options = BuildOptions::default();
/// let index = InMemoryVectorIndex::build(chunks, embedder.as_ref(), &options).await?;
/// let results = index.query(&question_embedding, 4).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the stored vectors.
    fn dimensions(&self) -> usize;

    /// The [`model_id`](crate::EmbeddingProvider::model_id) that produced the stored vectors.
    fn embedding_model(&self) -> &str;

    /// Return the `top_k` chunks most similar to `embedding`.
    ///
    /// Returns exactly `min(top_k, len())` results ordered by descending
    /// similarity score, ties broken by ascending chunk index.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}
