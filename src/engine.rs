//! The engine ties storage, index generations, and providers together.
//!
//! One [`Engine`] is shared by the CLI and the HTTP server. Readers work
//! against an immutable [`Generation`] snapshot behind an `Arc`; a rebuild
//! loads the fresh artifacts first and swaps the shared slot last, so
//! in-flight requests keep the generation they started with and stale
//! state is never served.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::answer::{self, create_qa_provider, Passage, QaProvider};
use crate::chunk::clean_text;
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::{EngineError, Result};
use crate::index::{build_index, BuildSummary, Generation};
use crate::models::{Answer, RiskItem, SearchResult};
use crate::retrieve;
use crate::risk;
use crate::store::{load_document_text, save_document_text};
use crate::suggest::suggest_queries;
use crate::summarize::{summarize_centroid, summarize_keywords};

pub struct Engine {
    config: Config,
    provider: Box<dyn EmbeddingProvider>,
    qa: Option<Box<dyn QaProvider>>,
    generation: RwLock<Option<Arc<Generation>>>,
}

impl Engine {
    /// Builds the engine from a validated config. The QA provider is only
    /// constructed when the model strategy asks for one.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider = create_provider(&config.embedding)?;
        let qa = create_qa_provider(&config)?;
        Ok(Self {
            config,
            provider,
            qa,
            generation: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current generation, loading it from disk on first use.
    ///
    /// Returns [`EngineError::IndexNotReady`] when no index has been built
    /// yet and [`EngineError::ModelMismatch`] when the artifacts were built
    /// with a different embedding model than the one configured.
    pub async fn snapshot(&self) -> Result<Arc<Generation>> {
        if let Some(generation) = self.generation.read().await.as_ref() {
            return Ok(Arc::clone(generation));
        }

        let mut slot = self.generation.write().await;
        if let Some(generation) = slot.as_ref() {
            return Ok(Arc::clone(generation));
        }
        let generation = Arc::new(Generation::load(&self.config.storage.index_dir())?);
        self.check_model(&generation)?;
        *slot = Some(Arc::clone(&generation));
        Ok(generation)
    }

    fn check_model(&self, generation: &Generation) -> Result<()> {
        let index_model = &generation.manifest.model;
        let configured = self.provider.model_name();
        if index_model != configured {
            return Err(EngineError::ModelMismatch {
                index: index_model.clone(),
                configured: configured.to_string(),
            });
        }
        Ok(())
    }

    /// Rebuilds the index from every stored document and swaps the new
    /// generation in. Snapshots handed out earlier stay valid.
    pub async fn rebuild(&self) -> Result<BuildSummary> {
        let summary = build_index(&self.config, self.provider.as_ref()).await?;
        let generation = Arc::new(Generation::load(&self.config.storage.index_dir())?);
        self.check_model(&generation)?;
        *self.generation.write().await = Some(generation);
        Ok(summary)
    }

    /// Cleans and stores a document, then rebuilds the index. Returns the
    /// number of chunks the document produced.
    pub async fn add_document(&self, doc_id: &str, raw: &str) -> Result<usize> {
        let cleaned = clean_text(raw);
        save_document_text(&self.config.storage.docs_dir(), doc_id, &cleaned)?;
        self.rebuild().await?;
        let generation = self.snapshot().await?;
        let chunks = generation.chunks_of(doc_id).len();
        info!(doc_id, chunks, "document added");
        Ok(chunks)
    }

    /// Top-k semantic search, defaulting to the configured k.
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<SearchResult>> {
        let k = top_k.unwrap_or(self.config.retrieval.top_k);
        let generation = self.snapshot().await?;
        retrieve::search(&generation, self.provider.as_ref(), query, k).await
    }

    /// Answers a question with the configured strategy.
    ///
    /// With `doc_id` the lexical strategy reads that document's stored text
    /// directly (no index required); the model strategy restricts retrieval
    /// hits to that document's chunks.
    pub async fn ask(
        &self,
        question: &str,
        doc_id: Option<&str>,
        top_k: Option<usize>,
    ) -> Result<Vec<Answer>> {
        let k = top_k.unwrap_or(self.config.qa.top_k);

        if let Some(qa) = &self.qa {
            let generation = self.snapshot().await?;
            if let Some(doc) = doc_id {
                if !generation.has_document(doc) {
                    return Err(EngineError::DocumentNotFound(doc.to_string()));
                }
            }
            let mut hits =
                retrieve::search(&generation, self.provider.as_ref(), question, k).await?;
            if let Some(doc) = doc_id {
                hits.retain(|hit| hit.doc_id == doc);
            }
            return Ok(answer::extract_model(qa.as_ref(), question, &hits).await);
        }

        let passages = match doc_id {
            Some(doc) => {
                let text = self.document_text(doc)?;
                vec![Passage {
                    source: doc.to_string(),
                    text,
                }]
            }
            None => {
                let generation = self.snapshot().await?;
                let hits =
                    retrieve::search(&generation, self.provider.as_ref(), question, k).await?;
                hits.into_iter()
                    .map(|hit| Passage {
                        source: hit.chunk_id,
                        text: hit.text,
                    })
                    .collect()
            }
        };
        Ok(answer::extract_lexical(question, &passages))
    }

    /// Summarizes a stored document with the configured strategy.
    pub async fn summarize(&self, doc_id: &str) -> Result<String> {
        if self.config.summary.strategy == "centroid" {
            let generation = self.snapshot().await?;
            return summarize_centroid(&generation, doc_id, self.config.summary.num_chunks);
        }
        let text = self.document_text(doc_id)?;
        Ok(summarize_keywords(&text))
    }

    /// Scans a stored document for risk markers.
    pub fn risks(&self, doc_id: &str) -> Result<Vec<RiskItem>> {
        let text = self.document_text(doc_id)?;
        risk::analyze(&text)
    }

    /// Suggests follow-up queries from a document's risk markers.
    pub fn suggest(&self, doc_id: &str) -> Result<Vec<String>> {
        let risks = self.risks(doc_id)?;
        Ok(suggest_queries(&risks))
    }

    /// The cleaned text of a stored document.
    pub fn document_text(&self, doc_id: &str) -> Result<String> {
        load_document_text(&self.config.storage.docs_dir(), doc_id)
    }
}
