//! Corpus ingestion.
//!
//! Two entry points: `ingest_file` pulls a single document into the store
//! and rebuilds, `sync_corpus` sweeps the whole document directory
//! (extracting any PDF that has no stored text yet) and rebuilds once at
//! the end.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::chunk::clean_text;
use crate::engine::Engine;
use crate::extract::{extract_from_named, extract_text, DocKind};
use crate::index::BuildSummary;
use crate::store::{list_documents, save_document_text};

pub struct SyncReport {
    /// Per-document chunk counts after the rebuild, sorted by doc id.
    pub documents: Vec<(String, usize)>,
    pub extracted_pdfs: usize,
    pub build: BuildSummary,
}

/// Extracts one file, stores it under its file stem, and rebuilds.
pub async fn ingest_file(engine: &Engine, path: &Path) -> Result<(String, usize)> {
    let filename = path
        .file_name()
        .and_then(OsStr::to_str)
        .with_context(|| format!("invalid file name: {}", path.display()))?;
    let doc_id = path
        .file_stem()
        .and_then(OsStr::to_str)
        .with_context(|| format!("invalid file name: {}", path.display()))?
        .to_string();

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = extract_from_named(&bytes, filename)?;
    let chunks = engine.add_document(&doc_id, &text).await?;
    Ok((doc_id, chunks))
}

/// Sweeps the document directory and rebuilds the index.
///
/// Every stored `.txt` is re-normalized in place; a `.pdf` with no `.txt`
/// counterpart is extracted and stored first. Files not matching the
/// configured include globs are ignored.
pub async fn sync_corpus(engine: &Engine) -> Result<SyncReport> {
    let docs_dir = engine.config().storage.docs_dir();
    fs::create_dir_all(&docs_dir)?;
    let include_set = build_globset(&engine.config().storage.include_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(&docs_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(&docs_dir).unwrap_or(path);
        if !include_set.is_match(relative) {
            continue;
        }
        paths.push(path.to_path_buf());
    }
    // Sort for deterministic ordering
    paths.sort();

    let mut extracted_pdfs = 0usize;
    for path in &paths {
        let Some(doc_id) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        match DocKind::from_path(path) {
            Some(DocKind::Text) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                save_document_text(&docs_dir, doc_id, &clean_text(&raw))?;
            }
            Some(DocKind::Pdf) => {
                if docs_dir.join(format!("{doc_id}.txt")).exists() {
                    continue;
                }
                let bytes = fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let text = extract_text(&bytes, DocKind::Pdf)?;
                save_document_text(&docs_dir, doc_id, &clean_text(&text))?;
                extracted_pdfs += 1;
            }
            None => {}
        }
    }

    let build = engine.rebuild().await?;

    let generation = engine.snapshot().await?;
    let mut documents = Vec::new();
    for doc_id in list_documents(&docs_dir)? {
        let chunks = generation.chunks_of(&doc_id).len();
        documents.push((doc_id, chunks));
    }

    Ok(SyncReport {
        documents,
        extracted_pdfs,
        build,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
