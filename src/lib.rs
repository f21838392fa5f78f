//! # Coverage Harness
//!
//! Retrieval-augmented test coverage analysis. An API's interface
//! specification and its test execution reports are turned into documents,
//! embedded into one index, and queried together so a generative backend can
//! reason about what is and is not tested.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ spec source  │──▶│ document builders │──▶│ CorpusIndex  │──▶ index.sqlite
//! │ results dir  │   │ (core crate)      │   │ (embeddings) │
//! └──────────────┘   └──────────────────┘   └──────┬───────┘
//!                                                  ▼
//!                       query ──▶ BalancedRetriever ──▶ CoverageAnalysisEngine
//! ```
//!
//! The pure pipeline lives in `coverage-harness-core`; this crate supplies
//! configuration, I/O, providers, persistence, and the `cov` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`connector_spec`] | Fetch the interface specification (URL or file) |
//! | [`connector_results`] | Discover and parse execution reports; read attachments |
//! | [`embedding`] | Embedding providers |
//! | [`generation`] | Generative backends |
//! | [`db`] | SQLite connection |
//! | [`index_store`] | Persist and load the corpus index |
//! | [`ingest`] | `cov ingest` |
//! | [`search`] | `cov search` |
//! | [`analyze`] | `cov analyze`, `cov generate-tests` |
//! | [`sources`] | `cov sources` |

pub mod analyze;
pub mod config;
pub mod connector_results;
pub mod connector_spec;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod index_store;
pub mod ingest;
pub mod search;
pub mod sources;
