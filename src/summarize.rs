//! Document summarization.
//!
//! Two strategies are offered. The keyword strategy scores sentences by
//! contract-specific vocabulary and needs nothing but the document text.
//! The centroid strategy picks the chunks closest to the document's mean
//! embedding and therefore requires a loaded index generation.

use std::cmp::Ordering;
use std::cmp::Reverse;

use crate::embedding::cosine_similarity;
use crate::error::{EngineError, Result};
use crate::index::Generation;
use crate::text::{split_sentences, truncate_chars};

/// Vocabulary that marks a sentence as summary-worthy.
const SUMMARY_KEYWORDS: [&str; 16] = [
    "termination",
    "notice",
    "payment",
    "net",
    "fee",
    "indemnity",
    "liability",
    "confidentiality",
    "renewal",
    "automatic",
    "governing law",
    "jurisdiction",
    "warranty",
    "breach",
    "penalty",
    "obligation",
];

/// At most this many sentences make the summary.
const MAX_SENTENCES: usize = 15;

/// Short documents are padded up to this many sentences.
const MIN_SENTENCES: usize = 7;

/// Characters kept per summary bullet.
const BULLET_CHARS: usize = 220;

/// Distinct keyword hits plus a one-point bonus for substantial length.
fn sentence_score(sentence: &str) -> usize {
    let lower = sentence.to_lowercase();
    let hits = SUMMARY_KEYWORDS
        .iter()
        .filter(|keyword| lower.contains(**keyword))
        .count();
    hits + usize::from(sentence.chars().count() >= 120)
}

/// Builds a bullet summary from the highest-scoring sentences.
///
/// Sentences are ranked by [`sentence_score`] with ties keeping document
/// order, capped at [`MAX_SENTENCES`]. When fewer survive, remaining
/// sentences pad the list in document order up to [`MIN_SENTENCES`]. Each
/// bullet is truncated to [`BULLET_CHARS`] characters.
pub fn summarize_keywords(text: &str) -> String {
    let sentences = split_sentences(text);

    let mut ranked: Vec<&str> = {
        let mut scored: Vec<(usize, &str)> = sentences
            .iter()
            .map(|(_, sentence)| (sentence_score(sentence), *sentence))
            .collect();
        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored
            .into_iter()
            .take(MAX_SENTENCES)
            .map(|(_, sentence)| sentence)
            .collect()
    };

    if ranked.len() < MIN_SENTENCES {
        for &(_, sentence) in &sentences {
            if ranked.len() >= MIN_SENTENCES {
                break;
            }
            if !ranked.contains(&sentence) {
                ranked.push(sentence);
            }
        }
    }

    ranked
        .iter()
        .map(|sentence| format!("- {}", truncate_chars(sentence, BULLET_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarizes a document by its most representative chunks.
///
/// The document's chunk vectors are averaged into a centroid and the
/// `num_chunks` chunks nearest to it (cosine) are returned in similarity
/// order, joined by blank lines. Fails with [`EngineError::DocumentNotFound`]
/// when the generation holds no chunks for `doc_id`.
pub fn summarize_centroid(
    generation: &Generation,
    doc_id: &str,
    num_chunks: usize,
) -> Result<String> {
    let chunk_ids = generation.chunks_of(doc_id);
    if chunk_ids.is_empty() {
        return Err(EngineError::DocumentNotFound(doc_id.to_string()));
    }

    let mut centroid = vec![0.0f32; generation.index.dims()];
    let mut vectors: Vec<(&str, &[f32])> = Vec::with_capacity(chunk_ids.len());
    for chunk_id in chunk_ids {
        let vector = generation.index.vector(chunk_id).ok_or_else(|| {
            EngineError::Corrupt(format!("chunk {chunk_id} has no vector in the index"))
        })?;
        for (acc, component) in centroid.iter_mut().zip(vector) {
            *acc += component;
        }
        vectors.push((chunk_id, vector));
    }
    let count = vectors.len() as f32;
    for acc in &mut centroid {
        *acc /= count;
    }

    let mut scored: Vec<(&str, f32)> = vectors
        .into_iter()
        .map(|(chunk_id, vector)| (chunk_id, cosine_similarity(&centroid, vector)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(num_chunks);

    let mut parts = Vec::with_capacity(scored.len());
    for (chunk_id, _) in scored {
        parts.push(generation.text(chunk_id)?.to_string());
    }
    Ok(parts.join("\n\n"))
}
