//! Execution report connector.
//!
//! Walks a results directory, selects files matching the configured glob
//! (`**/*-result.json` by default) and parses each into an
//! [`ExecutionRecord`]. Attachments are not read here; [`ResultsDirAttachments`]
//! resolves them lazily when documents are built.

use anyhow::Result;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use coverage_harness_core::models::ExecutionRecord;
use coverage_harness_core::{AttachmentSource, Error};

use crate::config::ResultsConfig;

pub struct ExecutionReportLoader {
    matcher: GlobMatcher,
}

impl ExecutionReportLoader {
    pub fn new(config: &ResultsConfig) -> Result<Self> {
        Ok(Self {
            matcher: Glob::new(&config.pattern)?.compile_matcher(),
        })
    }

    /// Result files under `dir`, sorted by relative path.
    ///
    /// A directory that does not exist yields no files.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "results directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(dir).unwrap_or(path);
            if self.matcher.is_match(relative) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }

    /// Parse every result file under `dir`.
    ///
    /// The first file that cannot be read or parsed aborts the whole load with
    /// [`Error::CorruptResult`] naming that file; no records are returned.
    pub fn load(&self, dir: &Path) -> Result<Vec<ExecutionRecord>> {
        let files = self.discover(dir)?;
        let mut records = Vec::with_capacity(files.len());
        for path in files {
            records.push(parse_result_file(&path)?);
        }
        tracing::info!(dir = %dir.display(), records = records.len(), "loaded execution reports");
        Ok(records)
    }
}

fn parse_result_file(path: &Path) -> std::result::Result<ExecutionRecord, Error> {
    let corrupt = |reason: String| Error::CorruptResult {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))
}

/// Reads attachments from `results_dir / attachment.path`.
///
/// Non-UTF-8 bytes are replaced rather than rejected.
pub struct ResultsDirAttachments {
    root: PathBuf,
}

impl ResultsDirAttachments {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AttachmentSource for ResultsDirAttachments {
    fn read_attachment(&self, path: &str) -> Option<String> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                tracing::debug!(path = %full.display(), error = %e, "attachment unreadable");
                None
            }
        }
    }
}
