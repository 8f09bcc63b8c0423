//! Chunking configuration.

use serde::{Deserialize, Serialize};

use crate::chunking::{BoundaryChunker, Chunker, FixedSizeChunker};
use crate::error::{RagError, Result};

/// How window ends are placed when splitting text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Exact-length windows.
    Fixed,
    /// Windows pulled back to the nearest paragraph, sentence or word break.
    #[default]
    Boundary,
}

/// Configuration parameters for document chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Window placement strategy.
    #[serde(default)]
    pub strategy: ChunkStrategy,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200, strategy: ChunkStrategy::Boundary }
    }
}

impl ChunkConfig {
    /// Create a new builder for constructing a [`ChunkConfig`].
    pub fn builder() -> ChunkConfigBuilder {
        ChunkConfigBuilder::default()
    }

    /// Check that `chunk_size > 0` and `chunk_overlap < chunk_size`.
    ///
    /// Configs deserialized from user input bypass the builder, so callers
    /// that accept them should validate before chunking.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Instantiate the [`Chunker`] described by this config.
    pub fn chunker(&self) -> Box<dyn Chunker> {
        match self.strategy {
            ChunkStrategy::Fixed => {
                Box::new(FixedSizeChunker::new(self.chunk_size, self.chunk_overlap))
            }
            ChunkStrategy::Boundary => {
                Box::new(BoundaryChunker::new(self.chunk_size, self.chunk_overlap))
            }
        }
    }
}

/// Builder for constructing a validated [`ChunkConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChunkConfigBuilder {
    config: ChunkConfig,
}

impl ChunkConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the window placement strategy.
    pub fn strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Build the [`ChunkConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    pub fn build(self) -> Result<ChunkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
