//! # Contract Intel CLI (`cintel`)
//!
//! The `cintel` binary is the primary interface for Contract Intel. It
//! provides commands for ingesting contracts, rebuilding the vector index,
//! semantic search, question answering, summarization, risk scanning, and
//! starting the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! cintel --config ./config/cintel.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cintel init` | Create the data directories |
//! | `cintel ingest <path>` | Ingest one `.txt`/`.pdf` contract and rebuild |
//! | `cintel reindex` | Re-scan the document store and rebuild everything |
//! | `cintel search "<query>"` | Semantic search over indexed chunks |
//! | `cintel ask "<question>"` | Extract the best answer to a question |
//! | `cintel summarize <doc_id>` | Bullet summary of a stored contract |
//! | `cintel risks <doc_id>` | Lexical risk markers with excerpts |
//! | `cintel suggest <doc_id>` | Suggested review queries |
//! | `cintel serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Create the data directories
//! cintel init --config ./config/cintel.toml
//!
//! # Ingest a contract
//! cintel ingest ./contracts/msa.pdf --config ./config/cintel.toml
//!
//! # Ask a question over the whole corpus
//! cintel ask "What is the notice period for termination?"
//!
//! # Ask within one document
//! cintel ask "Is liability capped?" --doc-id msa
//!
//! # Start the HTTP server
//! cintel serve --config ./config/cintel.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use contract_intel::config;
use contract_intel::engine::Engine;
use contract_intel::ingest;
use contract_intel::server;
use contract_intel::text::truncate_chars;

/// Contract Intel CLI — local contract ingestion, retrieval, and review.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cintel.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cintel",
    about = "Contract Intel — chunk, embed, and query legal contracts locally",
    version,
    long_about = "Contract Intel ingests legal contracts, splits them into overlapping \
    windows, embeds them into a local vector index, and answers questions, summarizes \
    documents, and flags risk language via a CLI and an HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// All storage, chunking, embedding, and server settings are read from
    /// this file.
    #[arg(long, global = true, default_value = "./config/cintel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the data directories.
    ///
    /// Creates `<data_dir>/docs/` and `<data_dir>/index/`. Idempotent.
    Init,

    /// Ingest a single contract and rebuild the index.
    ///
    /// Extracts text (`.txt` or `.pdf`), normalizes it, stores it under the
    /// file stem as document id, and rebuilds the vector index.
    Ingest {
        /// Path to the contract file.
        path: PathBuf,
    },

    /// Re-scan the document store and rebuild the index.
    ///
    /// Normalizes every stored text, extracts any PDF that has no stored
    /// text yet, and rebuilds all index artifacts from scratch.
    Reindex,

    /// Semantic search over indexed chunks.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a question from the corpus or one document.
    Ask {
        /// The question to answer.
        question: String,

        /// Restrict extraction to one stored document.
        #[arg(long)]
        doc_id: Option<String>,

        /// Number of chunks to retrieve as candidate passages.
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Summarize a stored document.
    Summarize {
        /// Document id (file stem or upload id).
        doc_id: String,
    },

    /// List risk markers found in a stored document.
    Risks {
        /// Document id (file stem or upload id).
        doc_id: String,
    },

    /// Suggest review queries for a stored document.
    Suggest {
        /// Document id (file stem or upload id).
        doc_id: String,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// upload, qa, summarize, risk, and auto_queries endpoints.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            std::fs::create_dir_all(cfg.storage.docs_dir())?;
            std::fs::create_dir_all(cfg.storage.index_dir())?;
            println!(
                "Initialized data directories under {}",
                cfg.storage.data_dir.display()
            );
        }
        Commands::Ingest { path } => {
            let engine = Engine::new(cfg)?;
            let (doc_id, chunks) = ingest::ingest_file(&engine, &path).await?;
            println!("ingest {}", path.display());
            println!("  doc id: {}", doc_id);
            println!("  chunks: {}", chunks);
            println!("ok");
        }
        Commands::Reindex => {
            let engine = Engine::new(cfg)?;
            let report = ingest::sync_corpus(&engine).await?;
            println!("reindex");
            println!("  documents: {}", report.build.documents);
            println!("  chunks: {}", report.build.chunks);
            println!("  dims: {}", report.build.dims);
            if report.extracted_pdfs > 0 {
                println!("  extracted pdfs: {}", report.extracted_pdfs);
            }
            for (doc_id, chunks) in &report.documents {
                println!("  {}: {} chunks", doc_id, chunks);
            }
            println!("ok");
        }
        Commands::Search { query, top_k } => {
            let engine = Engine::new(cfg)?;
            let results = engine.search(&query, top_k).await?;
            if results.is_empty() {
                println!("No results.");
            }
            for (i, result) in results.iter().enumerate() {
                let excerpt = result.text.replace('\n', " ");
                println!("{}. [{:.3}] {}", i + 1, result.score, result.chunk_id);
                println!(
                    "    doc: {} (chars {}..{})",
                    result.doc_id, result.start, result.end
                );
                println!("    excerpt: \"{}\"", truncate_chars(excerpt.trim(), 160));
                println!();
            }
        }
        Commands::Ask {
            question,
            doc_id,
            top_k,
        } => {
            let engine = Engine::new(cfg)?;
            let answers = engine.ask(&question, doc_id.as_deref(), top_k).await?;
            for (i, answer) in answers.iter().enumerate() {
                println!("{}. [{:.3}] {}", i + 1, answer.score, answer.text);
                if let Some(source) = &answer.source {
                    println!("    source: {}", source);
                }
                if !answer.context.is_empty() {
                    let context = answer.context.replace('\n', " ");
                    println!("    context: \"{}\"", context.trim());
                }
                println!();
            }
        }
        Commands::Summarize { doc_id } => {
            let engine = Engine::new(cfg)?;
            println!("{}", engine.summarize(&doc_id).await?);
        }
        Commands::Risks { doc_id } => {
            let engine = Engine::new(cfg)?;
            let risks = engine.risks(&doc_id)?;
            if risks.is_empty() {
                println!("No risk markers found.");
            }
            for risk in &risks {
                let context = risk.context.replace('\n', " ");
                println!("[{:?}] {}", risk.weight, risk.kind);
                println!("    context: \"{}\"", context.trim());
                println!();
            }
        }
        Commands::Suggest { doc_id } => {
            let engine = Engine::new(cfg)?;
            for (i, query) in engine.suggest(&doc_id)?.iter().enumerate() {
                println!("{}. {}", i + 1, query);
            }
        }
        Commands::Serve => {
            let engine = Arc::new(Engine::new(cfg)?);
            server::run_server(engine).await?;
        }
    }

    Ok(())
}
