//! # Coverage Harness Core
//!
//! Pure logic for Coverage Harness: the document model, the two document
//! builders, the in-memory corpus index, balanced retrieval, and analysis
//! prompt composition.
//!
//! This crate contains no tokio runtime, database, HTTP client, or
//! directory walking. External capabilities are reached through traits:
//!
//! | Trait | Capability |
//! |-------|------------|
//! | [`Embedder`] | text → fixed-length vector |
//! | [`Generator`] | prompt → text |
//! | [`AttachmentSource`] | attachment path → text |
//!
//! ## Pipeline
//!
//! ```text
//! interface spec ──▶ SpecDocumentBuilder ──────┐
//!                                              ├──▶ CorpusIndex::build
//! records ─────────▶ ExecutionDocumentBuilder ─┘          │
//!                                                         ▼
//! query ──▶ BalancedRetriever::retrieve ──▶ CoverageAnalysisEngine::answer
//! ```

pub mod analysis;
pub mod embedding;
pub mod error;
pub mod execution_doc;
pub mod index;
pub mod models;
pub mod retrieve;
pub mod spec_doc;

pub use analysis::{compose_prompt, CoverageAnalysisEngine, Generator, DEFAULT_SYSTEM_DIRECTIVE};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use execution_doc::{AttachmentSource, ExecutionDocumentBuilder};
pub use index::{CorpusIndex, IndexEntry};
pub use models::{Document, DocumentSource, ExecutionRecord, Metadata, ScoredDocument};
pub use retrieve::{BalancedRetriever, Retrieved, DEFAULT_K};
pub use spec_doc::SpecDocumentBuilder;
