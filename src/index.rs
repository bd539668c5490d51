//! Embedding index: the id-keyed in-memory search structure, the loaded
//! generation snapshot, and the full rebuild.
//!
//! Every rebuild is total: all stored documents are re-chunked, re-embedded,
//! and written out as a fresh artifact set. Search results carry chunk ids,
//! not row positions, and metadata/text are resolved through keyed lookups,
//! so the stores cannot silently desynchronize. The persisted files still
//! keep metadata rows in matrix row order so the artifacts round-trip.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::{l2_normalize, EmbeddingProvider};
use crate::error::{EngineError, Result};
use crate::models::{ChunkMeta, ChunkRecord, IndexManifest};
use crate::store;

/// Flat inner-product index over unit vectors, keyed by chunk id.
///
/// Vectors are L2-normalized at build time, so the inner product is the
/// cosine similarity and every score lands in `[-1, 1]`.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<(String, Vec<f32>)>,
    by_id: HashMap<String, usize>,
    dims: usize,
}

impl VectorIndex {
    pub fn new(entries: Vec<(String, Vec<f32>)>, dims: usize) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(row, (id, _))| (id.clone(), row))
            .collect();
        Self {
            entries,
            by_id,
            dims,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let (entries, dims) = store::read_vector_index(path)?;
        Ok(Self::new(entries, dims))
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The stored vector for one chunk id.
    pub fn vector(&self, chunk_id: &str) -> Option<&[f32]> {
        self.by_id
            .get(chunk_id)
            .map(|row| self.entries[*row].1.as_slice())
    }

    /// Top-k inner-product scan. Returns `(chunk_id, score)` pairs sorted
    /// by descending score; ties keep index order (stable sort).
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dims {
            return Err(EngineError::DimensionMismatch {
                expected: self.dims,
                actual: query.len(),
            });
        }
        let mut scored: Vec<(String, f32)> = self
            .entries
            .iter()
            .map(|(id, vector)| {
                let dot: f32 = vector.iter().zip(query).map(|(a, b)| a * b).sum();
                (id.clone(), dot)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// An immutable snapshot of one build: the search index plus the keyed
/// lookups every query path resolves through.
///
/// A generation is loaded once and never mutated; rebuilds publish a new
/// one. Readers holding an `Arc<Generation>` across a rebuild keep a fully
/// consistent (if stale) view.
#[derive(Debug)]
pub struct Generation {
    pub index: VectorIndex,
    pub manifest: IndexManifest,
    meta: HashMap<String, ChunkMeta>,
    texts: HashMap<String, String>,
    /// Chunk ids per document, in matrix row order.
    doc_chunks: HashMap<String, Vec<String>>,
}

impl Generation {
    /// Load a generation from the persisted artifacts.
    ///
    /// A missing manifest means no build has happened yet and maps to
    /// [`EngineError::IndexNotReady`]; structural inconsistencies between
    /// the artifacts are [`EngineError::Corrupt`].
    pub fn load(index_dir: &Path) -> Result<Self> {
        let manifest_path = index_dir.join(store::MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(EngineError::IndexNotReady);
        }
        let manifest = store::read_manifest(&manifest_path)?;
        let index = VectorIndex::load(&index_dir.join(store::INDEX_FILE))?;
        let metas: Vec<ChunkMeta> = store::read_jsonl(&index_dir.join(store::METADATA_FILE))?;
        let records: Vec<ChunkRecord> = store::read_jsonl(&index_dir.join(store::CHUNKS_FILE))?;

        if index.dims() != manifest.dims {
            return Err(EngineError::Corrupt(format!(
                "manifest says {} dims but index has {}",
                manifest.dims,
                index.dims()
            )));
        }
        if metas.len() != index.len() || records.len() != index.len() {
            return Err(EngineError::Corrupt(format!(
                "index has {} rows, metadata has {}, chunk store has {}",
                index.len(),
                metas.len(),
                records.len()
            )));
        }

        let mut doc_chunks: HashMap<String, Vec<String>> = HashMap::new();
        let mut meta = HashMap::with_capacity(metas.len());
        for m in metas {
            doc_chunks
                .entry(m.doc_id.clone())
                .or_default()
                .push(m.chunk_id.clone());
            meta.insert(m.chunk_id.clone(), m);
        }
        let texts: HashMap<String, String> = records
            .into_iter()
            .map(|r| (r.chunk_id, r.text))
            .collect();

        for (id, _) in &index.entries {
            if !meta.contains_key(id) || !texts.contains_key(id) {
                return Err(EngineError::Corrupt(format!(
                    "indexed chunk '{id}' has no metadata or text record"
                )));
            }
        }

        Ok(Self {
            index,
            manifest,
            meta,
            texts,
            doc_chunks,
        })
    }

    /// Metadata for one chunk id; absence is a hard consistency error.
    pub fn meta(&self, chunk_id: &str) -> Result<&ChunkMeta> {
        self.meta.get(chunk_id).ok_or_else(|| {
            EngineError::Corrupt(format!("chunk '{chunk_id}' missing from metadata store"))
        })
    }

    /// Text for one chunk id; absence is a hard consistency error.
    pub fn text(&self, chunk_id: &str) -> Result<&str> {
        self.texts.get(chunk_id).map(String::as_str).ok_or_else(|| {
            EngineError::Corrupt(format!("chunk '{chunk_id}' missing from chunk store"))
        })
    }

    /// Chunk ids of one document in index order; empty slice if unknown.
    pub fn chunks_of(&self, doc_id: &str) -> &[String] {
        self.doc_chunks
            .get(doc_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_document(&self, doc_id: &str) -> bool {
        self.doc_chunks.contains_key(doc_id)
    }
}

/// Counts reported after a rebuild.
#[derive(Debug, Clone, Copy)]
pub struct BuildSummary {
    pub documents: usize,
    pub chunks: usize,
    pub dims: usize,
}

/// Rebuild the full artifact set from every stored document.
///
/// Chunks all documents, embeds the chunk texts in `batch_size` batches,
/// normalizes to unit vectors, and atomically writes the matrix, vector
/// index, metadata, chunk store, and manifest. Idempotent for a fixed
/// corpus and provider.
pub async fn build_index(
    config: &Config,
    provider: &dyn EmbeddingProvider,
) -> Result<BuildSummary> {
    let docs_dir = config.storage.docs_dir();
    let index_dir = config.storage.index_dir();
    let doc_ids = store::list_documents(&docs_dir)?;

    let mut fingerprint = Sha256::new();
    let mut records: Vec<ChunkRecord> = Vec::new();
    for doc_id in &doc_ids {
        let text = store::load_document_text(&docs_dir, doc_id)?;
        fingerprint.update(doc_id.as_bytes());
        fingerprint.update([0u8]);
        fingerprint.update(Sha256::digest(text.as_bytes()));
        records.extend(chunk_text(
            doc_id,
            &text,
            config.chunking.size,
            config.chunking.overlap,
        )?);
    }

    info!(
        documents = doc_ids.len(),
        chunks = records.len(),
        model = provider.model_name(),
        "building index"
    );

    let dims = provider.dims();
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(records.len());
    for batch in texts.chunks(config.embedding.batch_size) {
        let embedded = provider
            .embed_texts(batch)
            .await
            .map_err(EngineError::Embedding)?;
        if embedded.len() != batch.len() {
            return Err(EngineError::Embedding(anyhow::anyhow!(
                "provider returned {} vectors for {} texts",
                embedded.len(),
                batch.len()
            )));
        }
        for mut vector in embedded {
            if vector.len() != dims {
                return Err(EngineError::DimensionMismatch {
                    expected: dims,
                    actual: vector.len(),
                });
            }
            l2_normalize(&mut vector);
            vectors.push(vector);
        }
    }

    let ids: Vec<String> = records.iter().map(|r| r.chunk_id.clone()).collect();
    let metas: Vec<ChunkMeta> = records.iter().map(ChunkMeta::from).collect();
    let manifest = IndexManifest {
        model: provider.model_name().to_string(),
        dims,
        chunks: records.len(),
        chunk_size: config.chunking.size,
        overlap: config.chunking.overlap,
        corpus_fingerprint: format!("{:x}", fingerprint.finalize()),
        built_at: Utc::now(),
    };

    store::write_jsonl(&index_dir.join(store::CHUNKS_FILE), &records)?;
    store::write_jsonl(&index_dir.join(store::METADATA_FILE), &metas)?;
    store::write_matrix(&index_dir.join(store::MATRIX_FILE), &vectors, dims)?;
    store::write_vector_index(&index_dir.join(store::INDEX_FILE), &ids, &vectors, dims)?;
    store::write_manifest(&index_dir.join(store::MANIFEST_FILE), &manifest)?;

    info!(chunks = records.len(), dims, "index build complete");

    Ok(BuildSummary {
        documents: doc_ids.len(),
        chunks: records.len(),
        dims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StorageConfig};
    use crate::embedding::create_provider;
    use tempfile::tempdir;

    fn unit(v: Vec<f32>) -> Vec<f32> {
        let mut v = v;
        l2_normalize(&mut v);
        v
    }

    fn small_index() -> VectorIndex {
        VectorIndex::new(
            vec![
                ("a_0".to_string(), unit(vec![1.0, 0.0])),
                ("a_1".to_string(), unit(vec![0.0, 1.0])),
                ("b_0".to_string(), unit(vec![1.0, 1.0])),
            ],
            2,
        )
    }

    #[test]
    fn test_search_sorted_and_capped() {
        let index = small_index();
        let query = unit(vec![1.0, 0.2]);
        let hits = index.search(&query, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].1 >= hits[1].1);
        assert_eq!(hits[0].0, "a_0");
    }

    #[test]
    fn test_search_more_than_rows_returns_all() {
        let index = small_index();
        let hits = index.search(&unit(vec![1.0, 0.0]), 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_dimension_mismatch() {
        let index = small_index();
        let err = index.search(&[1.0, 0.0, 0.0], 3).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_vector_lookup_by_id() {
        let index = small_index();
        assert!(index.vector("a_1").is_some());
        assert!(index.vector("ghost").is_none());
    }

    fn test_config(data_dir: &Path) -> Config {
        let mut config = Config {
            storage: StorageConfig {
                data_dir: data_dir.to_path_buf(),
                include_globs: vec!["*.txt".to_string()],
            },
            chunking: Default::default(),
            retrieval: Default::default(),
            embedding: Default::default(),
            qa: Default::default(),
            summary: Default::default(),
            server: Default::default(),
        };
        config.embedding.dims = Some(64);
        config.chunking.size = 40;
        config.chunking.overlap = 10;
        config
    }

    #[tokio::test]
    async fn test_build_and_load_generation() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let docs = config.storage.docs_dir();
        store::save_document_text(&docs, "nda", "Confidentiality obligations survive termination of this agreement for five years.").unwrap();
        store::save_document_text(&docs, "msa", "Payment terms are net 30. Late payment accrues a penalty.").unwrap();

        let provider = create_provider(&config.embedding).unwrap();
        let summary = build_index(&config, provider.as_ref()).await.unwrap();
        assert_eq!(summary.documents, 2);
        assert!(summary.chunks >= 2);

        let generation = Generation::load(&config.storage.index_dir()).unwrap();
        assert_eq!(generation.index.len(), summary.chunks);
        assert_eq!(generation.manifest.dims, 64);
        assert!(generation.has_document("nda"));
        assert!(generation.has_document("msa"));
        assert!(!generation.chunks_of("nda").is_empty());

        // Stored vectors are unit norm.
        for chunk_id in generation.chunks_of("msa") {
            let v = generation.index.vector(chunk_id).unwrap();
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4);
            generation.meta(chunk_id).unwrap();
            generation.text(chunk_id).unwrap();
        }
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let docs = config.storage.docs_dir();
        store::save_document_text(&docs, "lease", "Termination requires ninety days written notice to the landlord.").unwrap();

        let provider = create_provider(&config.embedding).unwrap();
        build_index(&config, provider.as_ref()).await.unwrap();
        let first = Generation::load(&config.storage.index_dir()).unwrap();
        build_index(&config, provider.as_ref()).await.unwrap();
        let second = Generation::load(&config.storage.index_dir()).unwrap();

        assert_eq!(first.index.len(), second.index.len());
        assert_eq!(
            first.manifest.corpus_fingerprint,
            second.manifest.corpus_fingerprint
        );
        for chunk_id in first.chunks_of("lease") {
            assert_eq!(
                first.index.vector(chunk_id).unwrap(),
                second.index.vector(chunk_id).unwrap()
            );
        }
    }

    #[test]
    fn test_load_without_artifacts_is_not_ready() {
        let dir = tempdir().unwrap();
        let err = Generation::load(&dir.path().join("index")).unwrap_err();
        assert!(matches!(err, EngineError::IndexNotReady));
    }
}
