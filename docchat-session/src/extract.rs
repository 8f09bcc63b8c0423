//! Text extraction for uploaded documents.
//!
//! Transports hand over an [`Upload`]; an extractor turns its bytes into a
//! [`Document`] or fails with [`ExtractionError`]. PDF support needs the
//! `pdf` feature.

use docchat_rag::Document;

use crate::error::ExtractionError;

/// Plain text, read as UTF-8.
pub const MIME_TEXT: &str = "text/plain";
/// Markdown, read as UTF-8.
pub const MIME_MARKDOWN: &str = "text/markdown";
/// PDF, text extracted when the `pdf` feature is enabled.
pub const MIME_PDF: &str = "application/pdf";

/// Raw bytes of an uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Display name, usually the file name.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents as received.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Wrap received bytes with their name and declared type.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes }
    }
}

/// Converts uploaded bytes to text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of `upload` as a [`Document`] named after it.
    fn extract(&self, upload: &Upload) -> Result<Document, ExtractionError>;
}

/// Dispatches on the declared content type: UTF-8 text and markdown are read
/// as-is, PDF goes through `pdf-extract` when the `pdf` feature is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeExtractor;

impl TextExtractor for ContentTypeExtractor {
    fn extract(&self, upload: &Upload) -> Result<Document, ExtractionError> {
        // Ignore parameters such as "; charset=utf-8".
        let mime = upload.content_type.split(';').next().unwrap_or_default().trim();
        let text = match mime {
            MIME_TEXT | MIME_MARKDOWN => extract_utf8(&upload.bytes)?,
            #[cfg(feature = "pdf")]
            MIME_PDF => extract_pdf(&upload.bytes)?,
            other => return Err(ExtractionError::UnsupportedContentType(other.to_string())),
        };
        Ok(Document::new(upload.name.as_str(), text))
    }
}

fn extract_utf8(bytes: &[u8]) -> Result<String, ExtractionError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ExtractionError::InvalidDocument {
        format: "text".into(),
        message: e.to_string(),
    })
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::InvalidDocument {
        format: "pdf".into(),
        message: e.to_string(),
    })
}

/// Guess a content type from a file name's extension.
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => MIME_PDF,
        Some(ext) if ext == "md" || ext == "markdown" => MIME_MARKDOWN,
        _ => MIME_TEXT,
    }
}
