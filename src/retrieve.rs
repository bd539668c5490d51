//! Top-k semantic retrieval over a loaded generation.

use std::time::Instant;

use tracing::debug;

use crate::embedding::{embed_query, l2_normalize, EmbeddingProvider};
use crate::error::{EngineError, Result};
use crate::index::Generation;
use crate::models::SearchResult;

/// Embed `query` with the same provider and normalization used at build
/// time and run an inner-product top-k scan.
///
/// Each hit's chunk id is resolved through the generation's keyed metadata
/// and text lookups; a dangling id is a consistency error, never a silent
/// skip.
pub async fn search(
    generation: &Generation,
    provider: &dyn EmbeddingProvider,
    query: &str,
    top_k: usize,
) -> Result<Vec<SearchResult>> {
    let started = Instant::now();
    let mut vector = embed_query(provider, query)
        .await
        .map_err(EngineError::Embedding)?;
    l2_normalize(&mut vector);

    let hits = generation.index.search(&vector, top_k)?;

    let mut results = Vec::with_capacity(hits.len());
    for (chunk_id, score) in hits {
        let meta = generation.meta(&chunk_id)?;
        let text = generation.text(&chunk_id)?;
        results.push(SearchResult {
            chunk_id: chunk_id.clone(),
            doc_id: meta.doc_id.clone(),
            start: meta.start,
            end: meta.end,
            score,
            text: text.to_string(),
        });
    }

    debug!(
        query,
        hits = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search complete"
    );

    Ok(results)
}
