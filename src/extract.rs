//! Text extraction for uploaded contract files.
//!
//! Uploads and ingested files arrive as raw bytes plus a filename; this
//! module turns them into plain UTF-8 text. Plain text is decoded lossily
//! (filed contracts are occasionally mislabeled latin-1), PDFs go through
//! `pdf-extract`.

use std::path::Path;

use crate::error::{EngineError, Result};

/// Document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Text,
    Pdf,
}

impl DocKind {
    /// Classify a file by extension (case-insensitive). Unknown extensions
    /// return `None`; callers report those as unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(DocKind::Text),
            "pdf" => Some(DocKind::Pdf),
            _ => None,
        }
    }
}

/// Extract plain text from raw file bytes.
pub fn extract_text(bytes: &[u8], kind: DocKind) -> Result<String> {
    match kind {
        DocKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DocKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| EngineError::Extract(e.to_string())),
    }
}

/// Classify and extract in one step, for callers that only have a filename.
pub fn extract_from_named(bytes: &[u8], filename: &str) -> Result<String> {
    let kind = DocKind::from_path(Path::new(filename))
        .ok_or_else(|| EngineError::UnsupportedFormat(filename.to_string()))?;
    extract_text(bytes, kind)
}
