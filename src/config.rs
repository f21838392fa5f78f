//! TOML configuration.
//!
//! Every section is optional; defaults point at a locally running API
//! (`http://127.0.0.1:8000/openapi.json`), `./allure-results`, and
//! `./combined_vector_db`. Each component receives its section explicitly;
//! nothing here is global.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use coverage_harness_core::DEFAULT_SYSTEM_DIRECTIVE;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub spec: SpecConfig,
    #[serde(default)]
    pub results: ResultsConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpecConfig {
    /// URL (`http://`, `https://`) or local file path of the interface specification.
    #[serde(default = "default_spec_source")]
    pub source: String,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            source: default_spec_source(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_spec_source() -> String {
    "http://127.0.0.1:8000/openapi.json".to_string()
}
fn default_fetch_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    #[serde(default = "default_results_dir")]
    pub dir: PathBuf,
    /// Glob (relative to `dir`) selecting execution result files.
    #[serde(default = "default_result_pattern")]
    pub pattern: String,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: default_results_dir(),
            pattern: default_result_pattern(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./allure-results")
}
fn default_result_pattern() -> String {
    "**/*-result.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./combined_vector_db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Documents fetched by the single similarity search per query.
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: default_k() }
    }
}

fn default_k() -> usize {
    coverage_harness_core::DEFAULT_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL override (Ollama server, OpenAI-compatible gateway).
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            timeout_secs: 30,
            url: None,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            timeout_secs: default_generation_timeout(),
            temperature: None,
        }
    }
}

fn default_generation_timeout() -> u64 {
    120
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AnalysisConfig {
    /// File holding the system directive; the built-in analyst directive is
    /// used when unset.
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
}

impl Config {
    /// Resolve the system directive: explicit override, then config file,
    /// then the built-in directive.
    pub fn system_directive(&self, override_path: Option<&Path>) -> Result<String> {
        match override_path.or(self.analysis.system_prompt_file.as_deref()) {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt: {}", path.display())),
            None => Ok(DEFAULT_SYSTEM_DIRECTIVE.to_string()),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.retrieval.k == 0 {
        anyhow::bail!("retrieval.k must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }

    globset::Glob::new(&config.results.pattern)
        .with_context(|| format!("Invalid results.pattern: {}", config.results.pattern))?;

    match config.embedding.provider.as_str() {
        "disabled" | "hash" => {}
        "openai" | "ollama" => {
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or hash.",
            other
        ),
    }

    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    Ok(())
}
