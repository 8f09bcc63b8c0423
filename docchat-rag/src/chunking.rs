//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations that
//! share one sliding-window walk:
//!
//! - [`FixedSizeChunker`]: exact-length windows of `chunk_size` characters
//! - [`BoundaryChunker`]: windows whose end is pulled back to a paragraph,
//!   sentence or word break when one exists inside the window
//!
//! Both are deterministic. Consecutive chunks always share exactly
//! `chunk_overlap` characters, so dropping the first `chunk_overlap`
//! characters of every chunk after the first and concatenating the rest
//! reproduces the input text. Sizes are counted in `char`s, never bytes.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Split `text` into exact-length overlapping windows.
///
/// Equivalent to [`FixedSizeChunker::new(chunk_size, overlap)`](FixedSizeChunker)
/// applied to a document containing `text`.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    sliding_windows(text, chunk_size, overlap, |_, _, _, end, _| end)
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// # Example
///
/// ```rust
/// use docchat_rag::{Chunker, Document, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(4, 1);
/// let chunks = chunker.chunk(&Document::new("memo", "abcdefghij"));
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "defg", "ghij"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        split(&document.text, self.chunk_size, self.chunk_overlap)
    }
}

/// Splits text into overlapping windows that prefer to end on natural breaks.
///
/// Each window end is pulled back to the last paragraph break (`\n\n`), then
/// sentence break (`. `, `! `, `? `, `\n`), then whitespace found inside the
/// window. A break is only used when the shortened window stays longer than
/// the overlap; otherwise the exact-length end is kept. The separator stays
/// with the preceding chunk.
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

/// Break tiers, strongest first.
const SEPARATOR_TIERS: &[&[&str]] = &[&["\n\n"], &[". ", "! ", "? ", "\n"], &[" ", "\t"]];

/// Pull `end` back to the strongest break that keeps the window longer than `overlap`.
fn snap_to_break(text: &str, bounds: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    let window = &text[bounds[start]..bounds[end]];
    let min_end = start + overlap + 1;

    for tier in SEPARATOR_TIERS {
        let cut = tier
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|pos| bounds[start] + pos + sep.len()))
            .max()
            .and_then(|byte| bounds.binary_search(&byte).ok());
        if let Some(cut) = cut.filter(|cut| *cut >= min_end) {
            return cut;
        }
    }
    end
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        sliding_windows(&document.text, self.chunk_size, self.chunk_overlap, snap_to_break)
    }
}

/// Walk `text` with windows of `chunk_size` chars, each starting `overlap`
/// chars before the previous end. `place_end` may move a non-final window end
/// anywhere in `(start + overlap, end]`.
fn sliding_windows<F>(text: &str, chunk_size: usize, overlap: usize, place_end: F) -> Vec<Chunk>
where
    F: Fn(&str, &[usize], usize, usize, usize) -> usize,
{
    if text.is_empty() {
        return Vec::new();
    }
    // Unvalidated parameters degrade to the nearest walk that still advances.
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    // Byte offset of every char, plus the end of the text.
    let bounds: Vec<usize> =
        text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let mut end = (start + chunk_size).min(len);
        if end < len {
            end = place_end(text, &bounds, start, end, overlap).clamp(start + overlap + 1, end);
        }
        chunks.push(Chunk::new(chunks.len(), &text[bounds[start]..bounds[end]]));
        if end == len {
            break;
        }
        start = end - overlap;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split("", 10, 2).is_empty());
        assert!(BoundaryChunker::new(10, 2).chunk(&Document::new("empty", "")).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split("hello", 10, 3);
        assert_eq!(texts(&chunks), ["hello"]);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].label, "0-pl");
    }

    #[test]
    fn text_of_exactly_one_window_is_not_repeated() {
        let chunks = split("abcdefghij", 10, 4);
        assert_eq!(texts(&chunks), ["abcdefghij"]);
    }

    #[test]
    fn three_thousand_chars_make_four_chunks() {
        let text = "x".repeat(3000);
        let chunks = split(&text, 1000, 200);
        let lens: Vec<usize> = chunks.iter().map(|c| c.text.len()).collect();
        assert_eq!(lens, [1000, 1000, 1000, 600]);
        let labels: Vec<&str> = chunks.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["0-pl", "1-pl", "2-pl", "3-pl"]);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let chunks = split("héllo wörld", 4, 1);
        assert_eq!(texts(&chunks), ["héll", "lo w", "wörl", "ld"]);
    }

    #[test]
    fn boundary_chunker_prefers_word_breaks() {
        let doc = Document::new("words", "alpha beta gamma delta");
        let chunks = BoundaryChunker::new(12, 2).chunk(&doc);
        assert_eq!(texts(&chunks), ["alpha beta ", "a gamma ", "a delta"]);
    }

    #[test]
    fn boundary_chunker_prefers_paragraphs_over_words() {
        let doc = Document::new("paras", "one two\n\nthree four five six");
        let chunks = BoundaryChunker::new(16, 0).chunk(&doc);
        assert_eq!(texts(&chunks), ["one two\n\n", "three four five ", "six"]);
    }

    #[test]
    fn boundary_chunker_falls_back_to_exact_length() {
        let doc = Document::new("dense", "abcdefghijklmnop");
        let chunks = BoundaryChunker::new(6, 2).chunk(&doc);
        assert_eq!(texts(&chunks), ["abcdef", "efghij", "ijklmn", "mnop"]);
    }

    #[test]
    fn invalid_overlap_still_terminates() {
        let chunks = split("abcdef", 2, 5);
        assert_eq!(texts(&chunks), ["ab", "bc", "cd", "de", "ef"]);
    }
}
