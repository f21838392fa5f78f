use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::connector_results::ExecutionReportLoader;
use crate::connector_spec::is_remote;
use crate::index_store;

/// Print the health of the three inputs: spec source, results, and index.
pub fn list_sources(config: &Config) -> Result<()> {
    let spec_status = if is_remote(&config.spec.source) {
        ("URL".to_string(), true)
    } else if Path::new(&config.spec.source).is_file() {
        ("OK".to_string(), true)
    } else {
        ("MISSING".to_string(), false)
    };

    let results_status = if config.results.dir.is_dir() {
        let loader = ExecutionReportLoader::new(&config.results)?;
        let files = loader.discover(&config.results.dir)?;
        (format!("OK ({} files)", files.len()), true)
    } else {
        ("MISSING".to_string(), false)
    };

    let index_status = if index_store::index_file(&config.index.path).is_file() {
        ("OK".to_string(), true)
    } else {
        ("NOT BUILT".to_string(), false)
    };

    println!("{:<10} {:<16} {:<8} LOCATION", "INPUT", "STATUS", "HEALTHY");
    println!(
        "{:<10} {:<16} {:<8} {}",
        "spec", spec_status.0, spec_status.1, config.spec.source
    );
    println!(
        "{:<10} {:<16} {:<8} {}",
        "results",
        results_status.0,
        results_status.1,
        config.results.dir.display()
    );
    println!(
        "{:<10} {:<16} {:<8} {}",
        "index",
        index_status.0,
        index_status.1,
        config.index.path.display()
    );

    Ok(())
}
