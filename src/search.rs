use anyhow::Result;

use coverage_harness_core::{BalancedRetriever, DocumentSource, Retrieved, ScoredDocument};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::index_store;

/// Run balanced retrieval for `query` against the persisted index.
pub async fn retrieve(config: &Config, query: &str, k: Option<usize>) -> Result<Retrieved> {
    let index = index_store::load(&config.index.path).await?;
    let embedder = create_embedder(&config.embedding)?;
    index_store::warn_on_model_mismatch(&index, embedder.as_ref());

    let k = k.unwrap_or(config.retrieval.k);
    let retrieved = BalancedRetriever::new(&index, embedder.as_ref())
        .retrieve(query, k)
        .await?;
    Ok(retrieved)
}

pub async fn run_search(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let retrieved = retrieve(config, query, k).await?;
    if retrieved.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, hit) in retrieved.iter().enumerate() {
        let source = hit
            .document
            .source()
            .map(|s| s.as_str())
            .unwrap_or("unknown");
        println!("{}. [{:.2}] {} / {}", i + 1, hit.score, source, describe(hit));
        let first_line = hit.document.content().lines().next().unwrap_or_default();
        println!("    excerpt: \"{}\"", first_line.trim());
        println!();
    }
    Ok(())
}

/// Identifying label for a hit: `METHOD path` or the test title.
pub fn describe(hit: &ScoredDocument) -> String {
    let doc = &hit.document;
    match doc.source() {
        Some(DocumentSource::Spec) => format!(
            "{} {}",
            doc.metadata_str("method").unwrap_or_default().to_uppercase(),
            doc.metadata_str("path").unwrap_or_default()
        ),
        Some(DocumentSource::Execution) => {
            let title = doc.metadata_str("title").unwrap_or("(untitled)");
            match (doc.metadata_str("feature"), doc.metadata_str("story")) {
                (Some(feature), Some(story)) => format!("{} ({} / {})", title, feature, story),
                _ => title.to_string(),
            }
        }
        None => "(unknown)".to_string(),
    }
}
