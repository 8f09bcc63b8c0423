//! Session lifecycle: one document index and one conversation per session.
//!
//! A [`SessionController`] maps opaque [`SessionId`]s to sessions. Each
//! session moves through `start_session` → `ingest` (retryable until it
//! succeeds once) → any number of `ask` calls → `end_session`.
//!
//! Sessions run independently. Within a session, ingest and ask calls are
//! serialized on the session's own lock, so every question sees exactly the
//! turns appended before it. Ending a session cancels its in-flight work;
//! results that complete afterwards are dropped with the session.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docchat_rag::{ChunkConfig, Document, EmbeddingProvider, InMemoryVectorIndex, VectorIndex};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::answer::{Answer, Answerer};
use crate::config::SessionConfig;
use crate::error::{AskError, IngestError};
use crate::extract::{ContentTypeExtractor, TextExtractor, Upload};
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::model::LanguageModel;

/// Opaque identifier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ready {
    /// The session that became ready.
    pub session_id: SessionId,
    /// Display name of the indexed document.
    pub document_name: String,
    /// Number of chunks in the session's index.
    pub chunk_count: usize,
}

/// What a transport can show about a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for a document.
    NotReady,
    /// A document is indexed and questions are accepted.
    Ready { document_name: String, chunk_count: usize, turns: usize },
}

struct ReadySession {
    document_name: String,
    index: InMemoryVectorIndex,
    memory: ConversationMemory,
    answerer: Answerer,
}

enum SessionState {
    NotReady,
    Ready(Box<ReadySession>),
}

struct SessionHandle {
    cancel: CancellationToken,
    /// Set once the state becomes `Ready`; never cleared.
    ready: AtomicBool,
    state: Mutex<SessionState>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            ready: AtomicBool::new(false),
            state: Mutex::new(SessionState::NotReady),
        }
    }
}

/// Owns every active session and routes operations to them.
///
/// Cloning is cheap and clones share the same sessions.
///
/// # Example
///
/// ```rust,ignore
/// use docchat_session::{SessionConfig, SessionController};
///
/// let controller = SessionController::new(embedder, model, SessionConfig::default());
/// let id = controller.start_session().await;
/// controller.ingest(id, document, &ChunkConfig::default()).await?;
/// let answer = controller.ask(id, "What is this document about?").await?;
/// println!("{}", answer.rendered());
/// controller.end_session(id).await;
/// ```
#[derive(Clone)]
pub struct SessionController {
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    extractor: Arc<dyn TextExtractor>,
    config: SessionConfig,
    sessions: Arc<RwLock<HashMap<SessionId, Arc<SessionHandle>>>>,
}

impl SessionController {
    /// Create a controller whose sessions all use `embedder` and `model`.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
        config: SessionConfig,
    ) -> Self {
        Self {
            embedder,
            model,
            extractor: Arc::new(ContentTypeExtractor),
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace the extractor used by [`ingest_upload`](Self::ingest_upload).
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Settings shared by every session of this controller.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an empty, not-ready session.
    pub async fn start_session(&self) -> SessionId {
        let session_id = SessionId::generate();
        self.sessions.write().await.insert(session_id, Arc::new(SessionHandle::new()));
        info!(%session_id, "session started");
        session_id
    }

    /// Number of active sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn handle(&self, session_id: SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Extract `upload` and ingest the resulting document.
    ///
    /// # Errors
    ///
    /// [`IngestError::Extraction`] if the bytes cannot be read as the declared
    /// type; otherwise as [`ingest`](Self::ingest).
    pub async fn ingest_upload(
        &self,
        session_id: SessionId,
        upload: &Upload,
        chunk_config: &ChunkConfig,
    ) -> Result<Ready, IngestError> {
        let document = self.extractor.extract(upload).map_err(|e| {
            warn!(
                %session_id,
                operation = "ingest",
                upload = %upload.name,
                error = %e,
                "extraction failed"
            );
            IngestError::from(e)
        })?;
        self.ingest(session_id, document, chunk_config).await
    }

    /// Chunk, embed and index `document`, making the session ready.
    ///
    /// A failed ingest leaves the session not ready and may be retried.
    ///
    /// # Errors
    ///
    /// - [`IngestError::UnknownSession`] for unknown or ended sessions
    /// - [`IngestError::AlreadyIngested`] if the session already has an index
    /// - [`IngestError::IndexBuild`] for an invalid chunk config, a document
    ///   with no text, or any embedding failure or timeout
    /// - [`IngestError::SessionClosed`] if the session ended meanwhile
    pub async fn ingest(
        &self,
        session_id: SessionId,
        document: Document,
        chunk_config: &ChunkConfig,
    ) -> Result<Ready, IngestError> {
        let handle = self.handle(session_id).await.ok_or(IngestError::UnknownSession(session_id))?;

        let result = tokio::select! {
            biased;
            _ = handle.cancel.cancelled() => Err(IngestError::SessionClosed(session_id)),
            result = self.run_ingest(session_id, &handle, document, chunk_config) => result,
        };
        let result = match result {
            Ok(_) if handle.cancel.is_cancelled() => Err(IngestError::SessionClosed(session_id)),
            other => other,
        };

        match &result {
            Ok(ready) => info!(
                %session_id,
                document = %ready.document_name,
                chunk_count = ready.chunk_count,
                "session ready"
            ),
            Err(e) => warn!(%session_id, operation = "ingest", error = %e, "ingest failed"),
        }
        result
    }

    async fn run_ingest(
        &self,
        session_id: SessionId,
        handle: &SessionHandle,
        document: Document,
        chunk_config: &ChunkConfig,
    ) -> Result<Ready, IngestError> {
        chunk_config.validate()?;

        let mut state = handle.state.lock().await;
        if matches!(*state, SessionState::Ready(_)) {
            return Err(IngestError::AlreadyIngested(session_id));
        }

        let chunks = chunk_config.chunker().chunk(&document);
        debug!(
            %session_id,
            document = %document.name,
            chunk_count = chunks.len(),
            "chunked document"
        );

        let index =
            InMemoryVectorIndex::build(chunks, self.embedder.as_ref(), &self.config.build_options())
                .await?;

        let answerer =
            Answerer::new(self.embedder.clone(), self.model.clone(), self.config.answerer.clone())
                .with_timeouts(self.config.embedding_timeout, self.config.generation_timeout);
        let ready = Ready {
            session_id,
            document_name: document.name.clone(),
            chunk_count: index.len(),
        };
        *state = SessionState::Ready(Box::new(ReadySession {
            document_name: document.name,
            index,
            memory: ConversationMemory::new(),
            answerer,
        }));
        handle.ready.store(true, Ordering::Release);
        Ok(ready)
    }

    /// Answer `question` in the session and record the turn.
    ///
    /// # Errors
    ///
    /// - [`AskError::UnknownSession`] for unknown or ended sessions
    /// - [`AskError::SessionNotReady`] until an ingest has completed
    /// - [`AskError::AnswerGeneration`] if the model fails; memory is unchanged
    /// - [`AskError::SessionClosed`] if the session ended meanwhile
    pub async fn ask(&self, session_id: SessionId, question: &str) -> Result<Answer, AskError> {
        let handle = self.handle(session_id).await.ok_or(AskError::UnknownSession(session_id))?;

        let result = tokio::select! {
            biased;
            _ = handle.cancel.cancelled() => Err(AskError::SessionClosed(session_id)),
            result = Self::run_ask(session_id, &handle, question) => result,
        };
        let result = match result {
            Ok(_) if handle.cancel.is_cancelled() => Err(AskError::SessionClosed(session_id)),
            other => other,
        };

        match &result {
            Ok(answer) => debug!(%session_id, source_count = answer.sources.len(), "answered"),
            Err(e @ AskError::SessionNotReady(_)) => {
                info!(%session_id, operation = "ask", error = %e, "question before upload")
            }
            Err(e) => warn!(%session_id, operation = "ask", error = %e, "ask failed"),
        }
        result
    }

    async fn run_ask(
        session_id: SessionId,
        handle: &SessionHandle,
        question: &str,
    ) -> Result<Answer, AskError> {
        if !handle.ready.load(Ordering::Acquire) {
            return Err(AskError::SessionNotReady(session_id));
        }
        let mut state = handle.state.lock().await;
        let SessionState::Ready(ready) = &mut *state else {
            return Err(AskError::SessionNotReady(session_id));
        };
        let ready = &mut **ready;
        ready.answerer.answer(question, &mut ready.memory, &ready.index).await
    }

    /// End the session, cancelling in-flight work and releasing its index and
    /// memory. Returns `false` if no such session existed.
    pub async fn end_session(&self, session_id: SessionId) -> bool {
        let Some(handle) = self.sessions.write().await.remove(&session_id) else {
            return false;
        };
        handle.cancel.cancel();
        info!(%session_id, "session ended");
        true
    }

    /// Current status, or `None` for unknown sessions.
    ///
    /// Waits for any in-flight operation on the session.
    pub async fn status(&self, session_id: SessionId) -> Option<SessionStatus> {
        let handle = self.handle(session_id).await?;
        let state = handle.state.lock().await;
        Some(match &*state {
            SessionState::NotReady => SessionStatus::NotReady,
            SessionState::Ready(ready) => SessionStatus::Ready {
                document_name: ready.document_name.clone(),
                chunk_count: ready.index.len(),
                turns: ready.memory.len(),
            },
        })
    }

    /// A copy of the session's conversation, or `None` if the session is
    /// unknown or not ready.
    pub async fn history(&self, session_id: SessionId) -> Option<Vec<ConversationTurn>> {
        let handle = self.handle(session_id).await?;
        let state = handle.state.lock().await;
        match &*state {
            SessionState::NotReady => None,
            SessionState::Ready(ready) => Some(ready.memory.history().to_vec()),
        }
    }
}
