use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the on-disk layout: documents under `docs/`, index
    /// artifacts under `index/`.
    pub data_dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl StorageConfig {
    pub fn docs_dir(&self) -> PathBuf {
        self.data_dir.join("docs")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["*.txt".to_string(), "*.pdf".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1800
}
fn default_chunk_overlap() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override for remote providers (required for `ollama`,
    /// optional for `openai`).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            base_url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "hash".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct QaConfig {
    /// `lexical` scores sentences by question-word hits; `model` calls an
    /// extractive QA inference endpoint per retrieved chunk.
    #[serde(default = "default_qa_strategy")]
    pub strategy: String,
    /// Inference endpoint for the `model` strategy.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_qa_top_k")]
    pub top_k: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            strategy: default_qa_strategy(),
            endpoint: None,
            top_k: default_qa_top_k(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_qa_strategy() -> String {
    "lexical".to_string()
}
fn default_qa_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummaryConfig {
    /// `keywords` selects sentences by domain-term hits; `centroid` selects
    /// the chunks nearest the document's mean embedding.
    #[serde(default = "default_summary_strategy")]
    pub strategy: String,
    #[serde(default = "default_num_chunks")]
    pub num_chunks: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            strategy: default_summary_strategy(),
            num_chunks: default_num_chunks(),
        }
    }
}

fn default_summary_strategy() -> String {
    "keywords".to_string()
}
fn default_num_chunks() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.size == 0 {
        anyhow::bail!("chunking.size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.size {
        anyhow::bail!(
            "chunking.overlap ({}) must be smaller than chunking.size ({})",
            config.chunking.overlap,
            config.chunking.size
        );
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "hash" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be hash, openai, ollama, or local.",
            other
        ),
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }

    // Validate QA
    match config.qa.strategy.as_str() {
        "lexical" => {}
        "model" => {
            if config.qa.endpoint.is_none() {
                anyhow::bail!("qa.endpoint must be specified when qa.strategy is 'model'");
            }
        }
        other => anyhow::bail!("Unknown qa.strategy: '{}'. Must be lexical or model.", other),
    }

    // Validate summary
    match config.summary.strategy.as_str() {
        "keywords" | "centroid" => {}
        other => anyhow::bail!(
            "Unknown summary.strategy: '{}'. Must be keywords or centroid.",
            other
        ),
    }
    if config.summary.num_chunks < 1 {
        anyhow::bail!("summary.num_chunks must be >= 1");
    }

    Ok(config)
}
