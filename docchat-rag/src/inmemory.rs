//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] keeps every chunk and its vector in a `Vec` in
//! chunk order. Queries are a linear scan, which is plenty for the few
//! hundred chunks a single uploaded document produces.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::{EmbeddingProvider, embed_batch_with_timeout};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Options controlling how [`InMemoryVectorIndex::build`] calls the embedder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildOptions {
    /// Maximum number of embedding requests in flight at once.
    pub concurrency: usize,
    /// Number of chunk texts sent per embedding request.
    pub batch_size: usize,
    /// Deadline for each embedding request.
    pub timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { concurrency: 8, batch_size: 16, timeout: Duration::from_secs(30) }
    }
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// An immutable in-memory vector index using cosine similarity for search.
#[derive(Debug, Clone)]
pub struct InMemoryVectorIndex {
    entries: Vec<IndexedChunk>,
    dimensions: usize,
    embedding_model: String,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl InMemoryVectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Chunks are embedded in batches of `options.batch_size`, with up to
    /// `options.concurrency` batches in flight. Batches may finish in any
    /// order; entries are stored in chunk order regardless.
    ///
    /// # Errors
    ///
    /// - [`RagError::IndexBuild`] if `chunks` is empty or the provider returns
    ///   vectors of inconsistent or zero dimensionality
    /// - any embedding error or timeout; a single failed batch fails the build
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        options: &BuildOptions,
    ) -> Result<Self> {
        if chunks.is_empty() {
            error!(provider = provider.model_id(), "no chunks to index");
            return Err(RagError::IndexBuild("document produced no chunks to index".to_string()));
        }

        let batch_size = options.batch_size.max(1);
        // Batches are (offset, end) index ranges; texts are borrowed inside each future so the
        // stream closure's argument carries no lifetime (keeps the future `Send` for callers).
        let batches: Vec<(usize, usize)> = (0..chunks.len())
            .step_by(batch_size)
            .map(|offset| (offset, (offset + batch_size).min(chunks.len())))
            .collect();
        let chunk_slice: &[Chunk] = &chunks;
        debug!(
            provider = provider.model_id(),
            chunk_count = chunks.len(),
            batch_count = batches.len(),
            "embedding chunks"
        );

        let mut embedded: Vec<(usize, Vec<Vec<f32>>)> = stream::iter(batches)
            .map(|(offset, end)| async move {
                let texts: Vec<&str> =
                    chunk_slice[offset..end].iter().map(|c| c.text.as_str()).collect();
                embed_batch_with_timeout(provider, &texts, options.timeout)
                    .await
                    .map(|vectors| (offset, vectors))
            })
            .buffer_unordered(options.concurrency.max(1))
            .try_collect()
            .await
            .map_err(|e| {
                error!(
                    provider = provider.model_id(),
                    error = %e,
                    "embedding failed during index build"
                );
                e
            })?;
        embedded.sort_by_key(|(offset, _)| *offset);

        let vectors: Vec<Vec<f32>> = embedded.into_iter().flat_map(|(_, v)| v).collect();
        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(RagError::IndexBuild("embedding provider returned empty vectors".into()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(RagError::IndexBuild(format!(
                "embedding dimensions differ within one document: {dimensions} and {}",
                bad.len()
            )));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        info!(
            provider = provider.model_id(),
            chunk_count = entries.len(),
            dimensions,
            "built vector index"
        );

        Ok(Self { entries, dimensions, embedding_model: provider.model_id().to_string() })
    }

    /// Iterate over the stored chunks in chunk order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let results = self.search(embedding, top_k)?;
        debug!(top_k, result_count = results.len(), "vector index query");
        Ok(results)
    }
}
