//! Sentence splitting and excerpt helpers shared by the selection
//! heuristics (answer extraction, summarization, risk excerpts).
//!
//! Everything here is offset-aware and multi-byte safe: contracts contain
//! curly quotes, section signs, and the odd accented name, and slicing at
//! the wrong byte would panic.

/// Split text into sentences on `.`, `!`, or `?` followed by whitespace.
///
/// Returns `(byte_offset, sentence)` pairs; each sentence is trimmed and
/// non-empty, and `byte_offset` points at its first character in `text`.
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    let mut sentences = Vec::new();
    let mut segment_start = 0usize;
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some((_, next)) = iter.peek() {
                if next.is_whitespace() {
                    push_trimmed(text, segment_start, i + 1, &mut sentences);
                    segment_start = i + 1;
                }
            }
        }
    }
    push_trimmed(text, segment_start, text.len(), &mut sentences);
    sentences
}

fn push_trimmed<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    out: &mut Vec<(usize, &'a str)>,
) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - raw.trim_start().len());
    out.push((offset, trimmed));
}

/// Excerpt up to 80 characters before `byte_idx` through 150 characters
/// after it, clipped to the text bounds.
pub fn excerpt_around(text: &str, byte_idx: usize) -> &str {
    let start = text[..byte_idx]
        .char_indices()
        .rev()
        .nth(79)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[byte_idx..]
        .char_indices()
        .nth(150)
        .map(|(i, _)| byte_idx + i)
        .unwrap_or(text.len());
    &text[start..end]
}

/// Truncate to at most `max` characters, on a character boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Collapse all whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_basic() {
        let text = "First clause. Second clause! Third clause? Trailing";
        let sentences: Vec<&str> = split_sentences(text).into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            sentences,
            vec![
                "First clause.",
                "Second clause!",
                "Third clause?",
                "Trailing"
            ]
        );
    }

    #[test]
    fn test_split_sentences_offsets_point_into_text() {
        let text = "One.  Two.\nThree.";
        for (offset, sentence) in split_sentences(text) {
            assert!(text[offset..].starts_with(sentence));
        }
    }

    #[test]
    fn test_split_sentences_ignores_mid_token_periods() {
        // No whitespace after the dot, so "net.30" stays in one sentence.
        let text = "Payment is net.30 per invoice. Next.";
        let sentences: Vec<&str> = split_sentences(text).into_iter().map(|(_, s)| s).collect();
        assert_eq!(sentences, vec!["Payment is net.30 per invoice.", "Next."]);
    }

    #[test]
    fn test_split_sentences_empty() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n ").is_empty());
    }

    #[test]
    fn test_excerpt_clips_to_bounds() {
        let text = "short text";
        assert_eq!(excerpt_around(text, 0), "short text");
        assert_eq!(excerpt_around(text, 6), "short text");
    }

    #[test]
    fn test_excerpt_window_size() {
        let text = "a".repeat(100) + "MATCH" + &"b".repeat(300);
        let excerpt = excerpt_around(&text, 100);
        assert!(excerpt.starts_with(&"a".repeat(80)));
        assert!(excerpt.contains("MATCH"));
        // 80 before + 150 from the match onward.
        assert_eq!(excerpt.chars().count(), 230);
    }

    #[test]
    fn test_excerpt_multibyte_safe() {
        let text = "é".repeat(200);
        let idx = text.char_indices().nth(100).unwrap().0;
        let excerpt = excerpt_around(&text, idx);
        assert_eq!(excerpt.chars().count(), 230);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars(&"é".repeat(5), 3), "ééé");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  spread \n across\t\tlines "),
            "spread across lines"
        );
    }
}
