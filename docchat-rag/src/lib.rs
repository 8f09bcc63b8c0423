//! # docchat-rag
//!
//! Chunking, embedding and similarity indexing for conversational question
//! answering over a single uploaded document.
//!
//! ## Overview
//!
//! - [`Chunker`] implementations split extracted text into overlapping passages
//! - [`EmbeddingProvider`] maps text to vectors (Ollama and OpenAI backends
//!   behind the `ollama` and `openai` features)
//! - [`InMemoryVectorIndex`] embeds a document's chunks once and answers
//!   top-k cosine similarity queries through the [`VectorIndex`] trait
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docchat_rag::{BuildOptions, ChunkConfig, Document, InMemoryVectorIndex, VectorIndex};
//!
//! let config = ChunkConfig::builder().chunk_size(1000).chunk_overlap(200).build()?;
//! let chunks = config.chunker().chunk(&Document::new("report.pdf", text));
//! let index = InMemoryVectorIndex::build(chunks, &embedder, &BuildOptions::default()).await?;
//! let hits = index.query(&embedder.embed("what changed?").await?, 4).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod inmemory;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{BoundaryChunker, Chunker, FixedSizeChunker, split};
pub use config::{ChunkConfig, ChunkConfigBuilder, ChunkStrategy};
pub use document::{Chunk, Document, SearchResult, chunk_label};
pub use embedding::{EmbeddingProvider, embed_batch_with_timeout, embed_with_timeout};
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use inmemory::{BuildOptions, InMemoryVectorIndex, cosine_similarity};
#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbeddingProvider;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
