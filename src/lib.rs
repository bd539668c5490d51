//! # Contract Intel
//!
//! A local pipeline for legal-contract intelligence.
//!
//! Contract Intel ingests contracts (plain text or PDF), normalizes and
//! splits them into overlapping character windows, embeds the windows into
//! a persisted vector index, and answers questions, summarizes documents,
//! and flags risk language over that representation via a CLI and an HTTP
//! server.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Contracts │──▶│   Pipeline    │──▶│ Index store  │
//! │  txt/pdf  │   │ chunk + embed │   │ mat/idx/meta │
//! └───────────┘   └───────────────┘   └──────┬───────┘
//!                                            │
//!                         ┌──────────────────┤
//!                         ▼                  ▼
//!                   ┌──────────┐       ┌──────────┐
//!                   │   CLI    │       │   HTTP   │
//!                   │ (cintel) │       │  (axum)  │
//!                   └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cintel init                          # create data directories
//! cintel ingest contracts/msa.pdf      # extract, store, index
//! cintel ask "What is the notice period for termination?"
//! cintel summarize msa
//! cintel risks msa
//! cintel serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`error`] | Typed pipeline errors |
//! | [`text`] | Sentence splitting and excerpt helpers |
//! | [`chunk`] | Text normalization and windowing |
//! | [`extract`] | Plain-text and PDF text extraction |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Index build and immutable generations |
//! | [`store`] | Persisted artifact formats |
//! | [`retrieve`] | Top-k semantic retrieval |
//! | [`answer`] | Lexical and model-based answer extraction |
//! | [`summarize`] | Keyword and centroid summarization |
//! | [`risk`] | Lexical risk taxonomy scan |
//! | [`suggest`] | Risk-driven query suggestions |
//! | [`engine`] | Service object tying it all together |
//! | [`ingest`] | File and corpus ingestion |
//! | [`server`] | HTTP API |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod risk;
pub mod server;
pub mod store;
pub mod suggest;
pub mod summarize;
pub mod text;
