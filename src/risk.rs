//! Keyword risk scan over contract text.
//!
//! Independent of the embedding pipeline: a fixed three-tier taxonomy of
//! clause markers is matched case-insensitively as literal substrings
//! against the full text, tier by tier. Each matched pattern contributes
//! one item with an excerpt around its first occurrence.

use crate::error::Result;
use crate::models::{RiskItem, RiskWeight};
use crate::text::excerpt_around;

const HIGH_RISK: [&str; 5] = [
    "termination",
    "penalty",
    "breach",
    "liability",
    "non-compete",
];

const MEDIUM_RISK: [&str; 4] = ["renewal", "confidentiality", "indemnity", "payment terms"];

const LOW_RISK: [&str; 4] = [
    "jurisdiction",
    "governing law",
    "notice period",
    "service clauses",
];

/// Scan `text` for risk markers. The result preserves tier order (High,
/// Medium, Low) and taxonomy order within a tier; a text with no matches
/// yields an empty list, never an error.
pub fn analyze(text: &str) -> Result<Vec<RiskItem>> {
    let mut risks = Vec::new();
    scan_tier(text, &HIGH_RISK, RiskWeight::High, &mut risks);
    scan_tier(text, &MEDIUM_RISK, RiskWeight::Medium, &mut risks);
    scan_tier(text, &LOW_RISK, RiskWeight::Low, &mut risks);
    Ok(risks)
}

fn scan_tier(text: &str, patterns: &[&str], weight: RiskWeight, out: &mut Vec<RiskItem>) {
    for pattern in patterns {
        if let Some(idx) = find_ascii_case_insensitive(text, pattern) {
            out.push(RiskItem {
                kind: (*pattern).to_string(),
                weight,
                context: excerpt_around(text, idx).to_string(),
            });
        }
    }
}

/// Byte offset of the first case-insensitive occurrence of `pattern`.
///
/// Patterns are ASCII, so a window starting inside a multi-byte character
/// can never match and every returned offset is a character boundary.
fn find_ascii_case_insensitive(text: &str, pattern: &str) -> Option<usize> {
    let haystack = text.as_bytes();
    let needle = pattern.as_bytes();
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}
