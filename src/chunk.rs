//! Text normalization and overlapping-window chunker.
//!
//! Contract text arrives with scanner artifacts and redaction markers;
//! [`clean_text`] canonicalizes those before storage. [`chunk_text`] then
//! splits the cleaned text into fixed-size character windows where each
//! window starts `overlap` characters before the previous one ended, so a
//! clause straddling a window boundary is fully contained in at least one
//! window.
//!
//! All offsets are character offsets, not byte offsets: contracts routinely
//! contain curly quotes and section signs, and slicing those at byte
//! positions would panic.

use crate::error::{EngineError, Result};
use crate::models::ChunkRecord;

/// Redaction spellings seen in filed contracts, longest first so the
/// bracketed forms are rewritten before the bare `***` inside them.
const REDACTION_MARKERS: [&str; 3] = ["[* * *]", "[***]", "***"];

/// Canonical replacement for every redaction marker variant.
pub const REDACTED_TOKEN: &str = "<REDACTED>";

/// Normalize raw extracted text: drop carriage returns, canonicalize
/// redaction markers, and trim surrounding whitespace. Inner line structure
/// is preserved; offsets into the cleaned text stay meaningful for excerpts.
pub fn clean_text(raw: &str) -> String {
    let mut text = raw.replace('\r', "");
    for marker in REDACTION_MARKERS {
        text = text.replace(marker, REDACTED_TOKEN);
    }
    text.trim().to_string()
}

/// Split `text` into overlapping windows of at most `size` characters.
///
/// Window `i + 1` starts exactly `overlap` characters before window `i`
/// ends; the final window may be shorter and iteration stops once a window
/// reaches the end of the text. An empty document yields a single empty
/// chunk spanning `[0, 0)` so every stored document has at least one row in
/// the index.
///
/// `size == 0` or `overlap >= size` would loop forever or walk backwards,
/// so both are rejected here as well as at config load.
pub fn chunk_text(
    doc_id: &str,
    text: &str,
    size: usize,
    overlap: usize,
) -> Result<Vec<ChunkRecord>> {
    if size == 0 {
        return Err(EngineError::InvalidChunking(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= size {
        return Err(EngineError::InvalidChunking(format!(
            "overlap ({overlap}) must be smaller than chunk size ({size})"
        )));
    }

    // Byte offset of each character boundary; boundaries[n_chars] == len.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    boundaries.push(text.len());
    let n_chars = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + size).min(n_chars);
        chunks.push(ChunkRecord {
            chunk_id: format!("{doc_id}_{}", chunks.len()),
            doc_id: doc_id.to_string(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start,
            end,
        });
        if end == n_chars {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_redaction_markers() {
        let cleaned = clean_text("Fee: [* * *] per unit, cap [***], floor ***.");
        assert_eq!(
            cleaned,
            "Fee: <REDACTED> per unit, cap <REDACTED>, floor <REDACTED>."
        );
    }

    #[test]
    fn test_clean_text_strips_carriage_returns_and_trims() {
        let cleaned = clean_text("  Section 1.\r\n\r\nPayment terms.  \r\n");
        assert_eq!(cleaned, "Section 1.\n\nPayment terms.");
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("doc1", "Hello, world!", 1800, 300).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, "doc1_0");
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, 13);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text_single_empty_chunk() {
        let chunks = chunk_text("doc1", "", 1800, 300).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].end, 0);
        assert!(chunks[0].text.is_empty());
    }

    #[test]
    fn test_windows_cover_text_with_exact_overlap() {
        let text = "abcdefghij".repeat(50); // 500 chars
        let chunks = chunk_text("doc1", &text, 120, 20).unwrap();

        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks.last().unwrap().end, 500);
        for pair in chunks.windows(2) {
            // Next window starts `overlap` chars before this one ends.
            assert_eq!(pair[1].start, pair[0].end - 20);
        }
        for c in &chunks {
            assert!(c.end - c.start <= 120);
            assert_eq!(c.text.chars().count(), c.end - c.start);
        }
    }

    #[test]
    fn test_multibyte_text_does_not_split_code_points() {
        let text = "é".repeat(10) + &"§ clause ".repeat(30);
        let chunks = chunk_text("doc1", &text, 50, 10).unwrap();
        let total_chars = text.chars().count();
        assert_eq!(chunks.last().unwrap().end, total_chars);
        for c in &chunks {
            assert_eq!(c.text.chars().count(), c.end - c.start);
        }
    }

    #[test]
    fn test_chunk_ids_are_ordinal() {
        let text = "x".repeat(300);
        let chunks = chunk_text("lease", &text, 100, 25).unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_id, format!("lease_{i}"));
            assert_eq!(c.doc_id, "lease");
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = chunk_text("doc1", "text", 0, 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChunking(_)));
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let err = chunk_text("doc1", "text", 100, 100).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChunking(_)));
        let err = chunk_text("doc1", "text", 100, 150).unwrap_err();
        assert!(matches!(err, EngineError::InvalidChunking(_)));
    }
}
