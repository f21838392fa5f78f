//! Source-balanced retrieval.
//!
//! A single top-k search over the whole corpus, followed by a stable
//! partition into spec documents and execution documents. The result is
//! the spec partition followed by the execution partition, each in
//! descending similarity order.
//!
//! Balance is best-effort. When the global top-k is dominated by one
//! source, the other source is under-represented or absent entirely; no
//! second per-source search is issued. Documents whose `source` label is
//! neither `spec` nor `execution` are dropped.

use serde::Serialize;

use crate::embedding::{embed_query, Embedder};
use crate::error::Result;
use crate::index::CorpusIndex;
use crate::models::{DocumentSource, ScoredDocument};

/// Default number of documents fetched by the single search call.
pub const DEFAULT_K: usize = 5;

/// Retrieval result, partitioned by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieved {
    pub spec: Vec<ScoredDocument>,
    pub execution: Vec<ScoredDocument>,
}

impl Retrieved {
    /// Stable partition of search hits by `metadata.source`.
    pub fn partition(hits: Vec<ScoredDocument>) -> Self {
        let mut out = Retrieved::default();
        for hit in hits {
            match hit.document.source() {
                Some(DocumentSource::Spec) => out.spec.push(hit),
                Some(DocumentSource::Execution) => out.execution.push(hit),
                None => {}
            }
        }
        out
    }

    /// Spec documents first, then execution documents.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredDocument> {
        self.spec.iter().chain(self.execution.iter())
    }

    pub fn into_ordered(self) -> Vec<ScoredDocument> {
        let mut all = self.spec;
        all.extend(self.execution);
        all
    }

    pub fn len(&self) -> usize {
        self.spec.len() + self.execution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spec.is_empty() && self.execution.is_empty()
    }

    /// Document contents joined by blank lines, in retrieval order.
    pub fn context(&self) -> String {
        self.iter()
            .map(|hit| hit.document.content())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Retrieves a source-partitioned context for a natural-language query.
pub struct BalancedRetriever<'a> {
    index: &'a CorpusIndex,
    embedder: &'a dyn Embedder,
}

impl<'a> BalancedRetriever<'a> {
    pub fn new(index: &'a CorpusIndex, embedder: &'a dyn Embedder) -> Self {
        Self { index, embedder }
    }

    /// Embed `query`, run one `search(vector, k)`, and partition the hits.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Retrieved> {
        let query_vec = embed_query(self.embedder, query).await?;
        let hits = self.index.search(&query_vec, k);
        let retrieved = Retrieved::partition(hits);
        tracing::debug!(
            k,
            spec = retrieved.spec.len(),
            execution = retrieved.execution.len(),
            "retrieved context"
        );
        Ok(retrieved)
    }
}
