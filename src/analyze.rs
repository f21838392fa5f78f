//! `cov analyze` and `cov generate-tests`.
//!
//! Both run one stateless retrieval + generation round trip and print the
//! backend's answer verbatim.

use anyhow::{bail, Result};
use std::path::Path;

use coverage_harness_core::{BalancedRetriever, CoverageAnalysisEngine};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::index_store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Coverage,
    Tests,
}

pub async fn run_analysis(
    config: &Config,
    kind: AnalysisKind,
    query: &str,
    system_prompt: Option<&Path>,
    k: Option<usize>,
) -> Result<()> {
    if !config.generation.is_enabled() {
        bail!("Analysis requires a generation backend. Set [generation] provider in config.");
    }
    let directive = config.system_directive(system_prompt)?;

    let index = index_store::load(&config.index.path).await?;
    let embedder = create_embedder(&config.embedding)?;
    index_store::warn_on_model_mismatch(&index, embedder.as_ref());
    let generator = create_generator(&config.generation)?;

    let engine = CoverageAnalysisEngine::new(
        BalancedRetriever::new(&index, embedder.as_ref()),
        generator.as_ref(),
        k.unwrap_or(config.retrieval.k),
    );

    let answer = match kind {
        AnalysisKind::Coverage => engine.analyze_coverage(&directive, query).await?,
        AnalysisKind::Tests => engine.generate_tests(&directive, query).await?,
    };
    println!("{}", answer);
    Ok(())
}
