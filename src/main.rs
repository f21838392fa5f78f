//! # Coverage Harness CLI (`cov`)
//!
//! ## Usage
//!
//! ```bash
//! cov --config ./config/cov.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cov sources` | Show the specification source, results directory, and index status |
//! | `cov ingest` | Build and persist the combined index |
//! | `cov search "<query>"` | Print the balanced retrieval result for a query |
//! | `cov analyze "<query>"` | Coverage analysis over the retrieved context |
//! | `cov generate-tests "<query>"` | Test suggestions over the retrieved context |
//!
//! Logs go to stderr. `RUST_LOG` overrides the default `warn` level;
//! `--verbose` lowers it to `debug`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use coverage_harness::analyze::{run_analysis, AnalysisKind};
use coverage_harness::{config, ingest, search, sources};

/// Coverage Harness: retrieval-augmented test coverage analysis over an API
/// specification and test execution reports.
#[derive(Parser)]
#[command(
    name = "cov",
    about = "Coverage Harness: retrieval-augmented test coverage analysis",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cov.toml")]
    config: PathBuf,

    /// Debug-level logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of the specification source, results directory, and index.
    Sources,

    /// Fetch the specification, load execution reports, embed everything,
    /// and persist the combined index.
    Ingest {
        /// Only count documents; embed and write nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Retrieve the balanced context for a query.
    Search {
        query: String,

        /// Documents fetched by the similarity search.
        #[arg(long)]
        k: Option<usize>,
    },

    /// Analyze test coverage for a query.
    Analyze {
        query: String,

        /// File holding a system directive to use instead of the configured one.
        #[arg(long)]
        system: Option<PathBuf>,

        #[arg(long)]
        k: Option<usize>,
    },

    /// Suggest additional tests for a query.
    GenerateTests {
        query: String,

        #[arg(long)]
        system: Option<PathBuf>,

        #[arg(long)]
        k: Option<usize>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => sources::list_sources(&cfg)?,
        Commands::Ingest { dry_run } => ingest::run_ingest(&cfg, dry_run).await?,
        Commands::Search { query, k } => search::run_search(&cfg, &query, k).await?,
        Commands::Analyze { query, system, k } => {
            run_analysis(&cfg, AnalysisKind::Coverage, &query, system.as_deref(), k).await?
        }
        Commands::GenerateTests { query, system, k } => {
            run_analysis(&cfg, AnalysisKind::Tests, &query, system.as_deref(), k).await?
        }
    }

    Ok(())
}
