//! Interface specification source.
//!
//! Fetches the raw JSON specification from an HTTP(S) URL or a local file.
//! Turning it into documents is [`SpecDocumentBuilder`]'s job.
//!
//! [`SpecDocumentBuilder`]: coverage_harness_core::SpecDocumentBuilder

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use coverage_harness_core::Error;

use crate::config::SpecConfig;

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load the specification named by `config.source`.
///
/// A non-success HTTP status fails with
/// `"Failed to fetch interface specification: <status>"`. A body that is
/// not JSON is a [`Error::MalformedSpec`].
pub async fn fetch_spec(config: &SpecConfig) -> Result<Value> {
    let raw = if is_remote(&config.source) {
        fetch_remote(&config.source, config.timeout_secs).await?
    } else {
        let path = Path::new(&config.source);
        std::fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read interface specification: {}",
                path.display()
            )
        })?
    };

    let spec: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::MalformedSpec(format!("not valid JSON: {}", e)))?;
    tracing::debug!(source = %config.source, bytes = raw.len(), "fetched interface specification");
    Ok(spec)
}

async fn fetch_remote(url: &str, timeout_secs: u64) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch interface specification from {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Failed to fetch interface specification: {}", status);
    }

    Ok(response.text().await?)
}
