//! Property tests for overlapping-window chunking.

use docchat_rag::{BoundaryChunker, Chunk, Chunker, Document, FixedSizeChunker, split};
use proptest::prelude::*;

/// Rebuild the source text by dropping each later chunk's leading overlap.
fn reassemble(chunks: &[Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let skip = if i == 0 { 0 } else { overlap };
        text.extend(chunk.text.chars().skip(skip));
    }
    text
}

fn tail(text: &str, n: usize) -> String {
    let len = text.chars().count();
    text.chars().skip(len.saturating_sub(n)).collect()
}

fn head(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Chunk size and an overlap strictly below it.
fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

/// Text with words, sentences, paragraphs and some multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    "([a-zé]{1,9}[ .!?\n]{0,2}){1,60}"
}

fn check_invariants(
    text: &str,
    chunks: &[Chunk],
    size: usize,
    overlap: usize,
) -> Result<(), TestCaseError> {
    prop_assert!(!chunks.is_empty());
    prop_assert_eq!(reassemble(chunks, overlap), text);
    for (i, chunk) in chunks.iter().enumerate() {
        prop_assert_eq!(chunk.index, i);
        prop_assert_eq!(&chunk.label, &format!("{i}-pl"));
        prop_assert!(!chunk.text.is_empty());
        prop_assert!(chunk.text.chars().count() <= size);
    }
    for pair in chunks.windows(2) {
        prop_assert_eq!(tail(&pair[0].text, overlap), head(&pair[1].text, overlap));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fixed_windows_reconstruct_text((size, overlap) in arb_window(), text in arb_text()) {
        let chunks = split(&text, size, overlap);
        check_invariants(&text, &chunks, size, overlap)?;
        // Every window but the last is full length.
        for chunk in &chunks[..chunks.len() - 1] {
            prop_assert_eq!(chunk.text.chars().count(), size);
        }
    }

    #[test]
    fn boundary_windows_reconstruct_text((size, overlap) in arb_window(), text in arb_text()) {
        let chunks = BoundaryChunker::new(size, overlap).chunk(&Document::new("doc", text.clone()));
        check_invariants(&text, &chunks, size, overlap)?;
    }

    #[test]
    fn chunking_is_deterministic((size, overlap) in arb_window(), text in arb_text()) {
        let doc = Document::new("doc", text);
        let chunker = BoundaryChunker::new(size, overlap);
        prop_assert_eq!(chunker.chunk(&doc), chunker.chunk(&doc));
        let fixed = FixedSizeChunker::new(size, overlap);
        prop_assert_eq!(fixed.chunk(&doc), fixed.chunk(&doc));
    }
}

#[test]
fn empty_text_has_no_chunks() {
    assert!(split("", 1000, 200).is_empty());
}
