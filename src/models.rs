//! Core data models shared across the contract-intel pipeline.
//!
//! These types represent the chunks, search results, answers, and risk
//! findings that flow through ingestion and retrieval, plus the manifest
//! that pins an index to the embedding space it was built in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One overlapping window of a document's cleaned text.
///
/// Stored in full (including `text`) in the chunk store; the metadata table
/// carries the same record minus `text`. `start`/`end` are character
/// offsets into the owning document's cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub doc_id: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Metadata row for one chunk, in the same order as the embedding matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub chunk_id: String,
    pub doc_id: String,
    pub start: usize,
    pub end: usize,
}

impl From<&ChunkRecord> for ChunkMeta {
    fn from(record: &ChunkRecord) -> Self {
        Self {
            chunk_id: record.chunk_id.clone(),
            doc_id: record.doc_id.clone(),
            start: record.start,
            end: record.end,
        }
    }
}

/// A ranked retrieval hit: chunk metadata plus text and cosine score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub chunk_id: String,
    pub doc_id: String,
    pub start: usize,
    pub end: usize,
    /// Cosine similarity in `[-1, 1]` (inner product of unit vectors).
    pub score: f32,
    pub text: String,
}

/// Severity tier of a detected risk pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskWeight {
    High,
    Medium,
    Low,
}

impl RiskWeight {
    /// Numeric rank used when ordering risks for query suggestion.
    pub fn rank(self) -> u8 {
        match self {
            RiskWeight::High => 3,
            RiskWeight::Medium => 2,
            RiskWeight::Low => 1,
        }
    }
}

/// One matched risk pattern with a bounded excerpt around the first hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskItem {
    /// Taxonomy keyword that matched (e.g. `"termination"`).
    #[serde(rename = "type")]
    pub kind: String,
    pub weight: RiskWeight,
    /// Excerpt spanning up to 80 characters before the first occurrence
    /// through 150 characters after, clipped to the text.
    pub context: String,
}

/// One extracted answer candidate, highest score first in responses.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Whitespace-collapsed answer text, truncated to 200 characters.
    pub text: String,
    /// Lexical match count or model confidence, depending on the strategy.
    pub score: f32,
    /// Originating chunk id (or document id in whole-document mode);
    /// `None` for the "no relevant information" placeholder.
    pub source: Option<String>,
    /// Bounded excerpt around the answer span.
    pub context: String,
}

/// Build-time facts about an index, persisted alongside the artifacts.
///
/// Checked when a generation is loaded: serving queries embedded with a
/// different model than the index produces meaningless scores, so a model
/// mismatch refuses to load rather than degrade silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model the chunk vectors were produced with.
    pub model: String,
    /// Embedding dimensionality.
    pub dims: usize,
    /// Number of chunk rows (matrix rows == metadata rows == index rows).
    pub chunks: usize,
    /// Chunk window size (characters) used at build time.
    pub chunk_size: usize,
    /// Window overlap (characters) used at build time.
    pub overlap: usize,
    /// SHA-256 over the sorted `(doc_id, text)` set the index was built from.
    pub corpus_fingerprint: String,
    pub built_at: DateTime<Utc>,
}
