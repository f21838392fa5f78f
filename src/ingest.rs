//! Ingestion pipeline orchestration.
//!
//! Spec source → operation documents, results directory → execution
//! documents; both sets are embedded into one [`CorpusIndex`] and persisted
//! to `index.path`.

use anyhow::{bail, Result};

use coverage_harness_core::{CorpusIndex, Document, ExecutionDocumentBuilder, SpecDocumentBuilder};

use crate::config::Config;
use crate::connector_results::{ExecutionReportLoader, ResultsDirAttachments};
use crate::connector_spec;
use crate::embedding::create_embedder;
use crate::index_store;

/// The documents of one ingest run, spec documents first.
pub struct Corpus {
    pub documents: Vec<Document>,
    pub spec_documents: usize,
    pub execution_documents: usize,
}

/// Fetch the specification and load execution reports into documents.
///
/// Fails before anything is embedded when the specification is malformed or
/// any result file is corrupt.
pub async fn collect_corpus(config: &Config) -> Result<Corpus> {
    let spec = connector_spec::fetch_spec(&config.spec).await?;
    let mut documents = SpecDocumentBuilder::new().build(&spec)?;
    let spec_documents = documents.len();

    let loader = ExecutionReportLoader::new(&config.results)?;
    let records = loader.load(&config.results.dir)?;
    let builder = ExecutionDocumentBuilder::new(ResultsDirAttachments::new(&config.results.dir));
    documents.extend(builder.build_all(&records));
    let execution_documents = documents.len() - spec_documents;

    tracing::info!(spec_documents, execution_documents, "collected corpus");
    Ok(Corpus {
        documents,
        spec_documents,
        execution_documents,
    })
}

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    if !dry_run && !config.embedding.is_enabled() {
        bail!("Ingest requires embeddings. Set [embedding] provider in config.");
    }

    let corpus = collect_corpus(config).await?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  spec documents: {}", corpus.spec_documents);
        println!("  execution documents: {}", corpus.execution_documents);
        return Ok(());
    }

    let embedder = create_embedder(&config.embedding)?;
    let index = CorpusIndex::build(
        embedder.as_ref(),
        corpus.documents,
        config.embedding.batch_size,
    )
    .await?;
    index_store::persist(&index, &config.index.path).await?;

    println!("ingest");
    println!("  spec documents: {}", corpus.spec_documents);
    println!("  execution documents: {}", corpus.execution_documents);
    println!("  model: {} ({} dims)", index.model_name(), index.dims());
    println!(
        "  index: {}",
        index_store::index_file(&config.index.path).display()
    );
    println!("ok");
    Ok(())
}
