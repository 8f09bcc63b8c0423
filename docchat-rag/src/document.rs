//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// Extracted text of an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Display name, usually the uploaded file name.
    pub name: String,
    /// The full extracted text.
    pub text: String,
}

impl Document {
    /// Create a document from a display name and its text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// A contiguous passage of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position in emission order, starting at 0.
    pub index: usize,
    /// Source label derived from the index, e.g. `"3-pl"`.
    pub label: String,
    /// The passage text. Never empty.
    pub text: String,
}

impl Chunk {
    /// Create the chunk emitted at `index`.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, label: chunk_label(index), text: text.into() }
    }
}

/// The source label for the chunk at `index`.
pub fn chunk_label(index: usize) -> String {
    format!("{index}-pl")
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}
