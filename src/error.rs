//! Typed error conditions for the contract-intel pipeline.
//!
//! The HTTP shim and CLI map these onto status codes and exit messages, so
//! the conditions a caller must distinguish (missing document, unbuilt
//! index, embedding-space mismatch) are variants rather than strings.

use thiserror::Error;

/// Errors produced by the core pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested document id has no stored text or indexed chunks.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Retrieval was attempted before any index artifacts were built.
    #[error("index not ready: run ingest or reindex first")]
    IndexNotReady,

    /// The query embedding does not match the index dimensionality.
    #[error("embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch {
        /// Dimensionality recorded in the index manifest.
        expected: usize,
        /// Dimensionality of the vector produced for the query.
        actual: usize,
    },

    /// The configured embedding model differs from the one the index was
    /// built with. Scores across mismatched spaces are meaningless, so this
    /// is refused up front.
    #[error("index was built with embedding model '{index}' but provider is '{configured}'; reindex first")]
    ModelMismatch {
        /// Model name recorded in the index manifest.
        index: String,
        /// Model name of the currently configured provider.
        configured: String,
    },

    /// Chunking was called with an impossible window configuration.
    #[error("invalid chunking parameters: {0}")]
    InvalidChunking(String),

    /// The uploaded or ingested file has an extension we cannot extract
    /// text from.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Byte-level text extraction failed (malformed PDF, etc.).
    #[error("text extraction failed: {0}")]
    Extract(String),

    /// The embedding or QA provider failed after retries.
    #[error("embedding provider failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// A persisted artifact could not be decoded, or a chunk id returned by
    /// the index has no metadata/text entry.
    #[error("index artifacts are corrupt: {0}")]
    Corrupt(String),

    /// Filesystem failure while reading or writing artifacts.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Record (de)serialization failure in the JSONL stores.
    #[error("failed to decode stored record: {0}")]
    Record(#[from] serde_json::Error),
}

/// Shorthand used throughout the core modules.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
