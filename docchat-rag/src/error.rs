//! Error types for the `docchat-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while chunking, embedding or indexing a document.
#[derive(Debug, Error)]
pub enum RagError {
    /// An embedding backend returned an error.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An external service did not answer within its deadline.
    #[error("Service unavailable ({service}): no response within {timeout:?}")]
    ServiceUnavailable {
        /// The service that timed out.
        service: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The vector index could not be built.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// A vector did not have the dimensionality the index expects.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether repeating the same call later may succeed.
    ///
    /// Timeouts and transport-level embedding failures are retryable; a
    /// malformed configuration or an empty document is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::ServiceUnavailable { .. } | RagError::EmbeddingError { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
