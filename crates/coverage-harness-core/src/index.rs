//! In-memory vector index over the mixed corpus.
//!
//! [`CorpusIndex::build`] embeds every document and keeps
//! `(vector, document)` entries in build order. Search is brute-force
//! cosine similarity; the sort is stable, so documents with equal scores
//! keep their build order. That makes a reloaded index rank exactly like
//! the one that was persisted, since persistence preserves entry order.
//!
//! A build is all-or-nothing: if any batch fails to embed, no index is
//! returned.

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{Error, Result};
use crate::models::{Document, ScoredDocument};

/// One embedded document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub document: Document,
}

/// A searchable, embedded corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusIndex {
    model: String,
    dims: usize,
    entries: Vec<IndexEntry>,
}

impl CorpusIndex {
    /// Embed `documents` in batches of `batch_size` and build the index.
    ///
    /// # Errors
    ///
    /// [`Error::EmbeddingService`] if the embedder fails, returns the wrong
    /// number of vectors for a batch, or returns vectors of inconsistent
    /// length. Not retried.
    pub async fn build(
        embedder: &dyn Embedder,
        documents: Vec<Document>,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let mut entries = Vec::with_capacity(documents.len());
        let mut dims: Option<usize> = None;

        for (batch_no, batch) in documents.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.content().to_string()).collect();
            let vectors = embedder.embed_texts(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(
                    "build index",
                    format!(
                        "batch {}: expected {} vectors, got {}",
                        batch_no,
                        batch.len(),
                        vectors.len()
                    ),
                ));
            }

            for (doc, vector) in batch.iter().zip(vectors) {
                let expected = *dims.get_or_insert(vector.len());
                if vector.len() != expected || expected == 0 {
                    return Err(Error::embedding(
                        "build index",
                        format!(
                            "inconsistent vector length {} (expected {})",
                            vector.len(),
                            expected
                        ),
                    ));
                }
                entries.push(IndexEntry {
                    vector,
                    document: doc.clone(),
                });
            }

            tracing::debug!(batch = batch_no, size = batch.len(), "embedded batch");
        }

        tracing::info!(
            documents = entries.len(),
            model = embedder.model_name(),
            "built corpus index"
        );

        Ok(Self {
            model: embedder.model_name().to_string(),
            dims: dims.unwrap_or_else(|| embedder.dims()),
            entries,
        })
    }

    /// Reassemble an index from previously built parts (used when loading a
    /// persisted index).
    pub fn from_parts(model: impl Into<String>, dims: usize, entries: Vec<IndexEntry>) -> Self {
        Self {
            model: model.into(),
            dims,
            entries,
        }
    }

    /// Return up to `k` documents, best match first.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<ScoredDocument> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(query_vec, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    pub fn model_name(&self) -> &str {
        &self.model
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

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }
}
