//! Error types for the `docchat-session` crate.

use std::time::Duration;

use docchat_rag::RagError;
use thiserror::Error;

use crate::session::SessionId;

/// The uploaded bytes could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No extractor handles the declared content type.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The bytes are not valid for the declared format.
    #[error("invalid {format} document: {message}")]
    InvalidDocument {
        /// The declared format.
        format: String,
        /// A description of the failure.
        message: String,
    },
}

/// The language model failed to produce an answer.
#[derive(Debug, Error)]
pub enum AnswerGenerationError {
    /// The model backend returned an error.
    #[error("model error ({provider}): {message}")]
    Model {
        /// The model that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The model did not answer within its deadline.
    #[error("model unavailable ({provider}): no response within {timeout:?}")]
    ServiceUnavailable {
        /// The model that timed out.
        provider: String,
        /// The deadline that elapsed.
        timeout: Duration,
    },
}

impl AnswerGenerationError {
    /// Whether re-asking later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnswerGenerationError::ServiceUnavailable { .. })
    }
}

/// Failures of [`SessionController::ingest`](crate::SessionController::ingest).
#[derive(Debug, Error)]
pub enum IngestError {
    /// No session with this id exists.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The session already holds an index; start a new session instead.
    #[error("session {0} already has an indexed document")]
    AlreadyIngested(SessionId),

    /// The upload could not be converted to text.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Chunking, embedding or index construction failed.
    #[error("index build failed: {0}")]
    IndexBuild(#[from] RagError),

    /// The session ended while the document was being indexed.
    #[error("session {0} ended during ingest")]
    SessionClosed(SessionId),
}

impl IngestError {
    /// Whether the same ingest may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::IndexBuild(e) if e.is_retryable())
    }
}

/// Failures of [`SessionController::ask`](crate::SessionController::ask) and
/// [`Answerer::answer`](crate::Answerer::answer).
#[derive(Debug, Error)]
pub enum AskError {
    /// No session with this id exists.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// No document has been indexed in this session yet.
    #[error("session {0} is not ready: upload a document first")]
    SessionNotReady(SessionId),

    /// The index was built by a different embedding model than the one
    /// embedding the question.
    #[error("index was embedded with '{index_model}' but questions use '{question_model}'")]
    EmbeddingModelMismatch {
        /// Model recorded by the index.
        index_model: String,
        /// Model of the question embedder.
        question_model: String,
    },

    /// Embedding the question or querying the index failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    /// The language model failed; memory is unchanged.
    #[error(transparent)]
    AnswerGeneration(#[from] AnswerGenerationError),

    /// The session ended while the question was being answered.
    #[error("session {0} ended while answering")]
    SessionClosed(SessionId),
}

impl AskError {
    /// Whether re-asking the same question may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AskError::Retrieval(e) => e.is_retryable(),
            AskError::AnswerGeneration(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// A convenience result type for answering.
pub type Result<T> = std::result::Result<T, AskError>;
