//! Error taxonomy for the ingestion, indexing, and analysis pipeline.
//!
//! Every failure the core can produce maps to exactly one variant. Missing
//! optional data (summary, description, feature, story, attachments) is
//! never an error; it is rendered as a named default or omitted.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The interface specification lacks a `paths` mapping.
    #[error("Malformed interface specification: {0}")]
    MalformedSpec(String),

    /// An execution report file could not be read or parsed.
    #[error("Corrupt execution result {}: {reason}", path.display())]
    CorruptResult { path: PathBuf, reason: String },

    /// The embedding capability was unreachable or rejected its input.
    #[error("Embedding service error during {operation}: {message}")]
    EmbeddingService { operation: String, message: String },

    /// The generative backend call failed.
    #[error("Generation backend error during {operation}: {message}")]
    GenerationBackend { operation: String, message: String },

    /// No persisted index exists at the given location.
    #[error("No index found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    /// A persisted index exists but cannot be read back.
    #[error("Index at {} is corrupt: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    /// Writing the index to durable storage failed.
    #[error("Failed to persist index to {}: {reason}", path.display())]
    IndexPersist { path: PathBuf, reason: String },
}

impl Error {
    pub fn embedding(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::EmbeddingService {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn generation(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::GenerationBackend {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn corrupt_index(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::IndexCorrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
