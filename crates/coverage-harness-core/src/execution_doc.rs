//! Execution record → narrative document.
//!
//! Each [`ExecutionRecord`] becomes exactly one [`Document`] that reads as a
//! single story of the test run: header fields, the label set, then every
//! step in order with the text of its attachments inlined. Attachment text
//! is inlined (rather than referenced by file name) so that similarity
//! search can match on assertion messages, logged payloads and the like.
//!
//! # Content layout
//!
//! ```text
//! Test Name: test_create_task
//! Status: passed
//! UUID: 6f1c…
//! Full Name: tests.test_main#test_create_task
//! Duration: 42ms
//! Labels: [ … ]
//!
//! Step Name: POST /tasks/
//! Status: passed
//! Duration: 9ms
//!
//! Attachment (response):
//! {"id": 1, "title": "Write docs"}
//! ```
//!
//! Attachment bodies are fetched through an [`AttachmentSource`]. A missing
//! attachment drops that attachment's section and nothing else.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde_json::json;

use crate::models::{Document, DocumentSource, ExecutionRecord, Metadata, SOURCE_KEY};

pub const NO_FEATURE: &str = "No feature";
pub const NO_STORY: &str = "No story";
pub const NO_TITLE: &str = "No title";
/// Rendered for unavailable durations and absent scalar fields.
pub const NOT_AVAILABLE: &str = "N/A";

/// Resolves an attachment reference to its text content.
///
/// `path` is relative to the results directory the record was loaded from.
/// Returns `None` when the attachment cannot be found or read.
pub trait AttachmentSource: Send + Sync {
    fn read_attachment(&self, path: &str) -> Option<String>;
}

/// In-memory attachments keyed by relative path.
impl AttachmentSource for HashMap<String, String> {
    fn read_attachment(&self, path: &str) -> Option<String> {
        self.get(path).cloned()
    }
}

/// Builds execution documents, resolving attachments through `A`.
pub struct ExecutionDocumentBuilder<A: AttachmentSource> {
    attachments: A,
}

impl<A: AttachmentSource> ExecutionDocumentBuilder<A> {
    pub fn new(attachments: A) -> Self {
        Self { attachments }
    }

    pub fn build(&self, record: &ExecutionRecord) -> Document {
        let mut content = String::new();

        let labels_text =
            serde_json::to_string_pretty(&record.labels).unwrap_or_else(|_| "[]".to_string());

        // Writing into a String cannot fail.
        let _ = write!(
            content,
            "Test Name: {}\nStatus: {}\nUUID: {}\nFull Name: {}\nDuration: {}\nLabels: {}\n",
            or_na(record.name.as_deref()),
            or_na(record.status.as_deref()),
            or_na(record.uuid.as_deref()),
            or_na(record.full_name.as_deref()),
            format_duration(record.duration_ms()),
            labels_text,
        );

        for step in &record.steps {
            let _ = write!(
                content,
                "\nStep Name: {}\nStatus: {}\nDuration: {}\n",
                or_na(step.name.as_deref()),
                or_na(step.status.as_deref()),
                format_duration(step.duration_ms()),
            );

            for attachment in &step.attachments {
                match self.attachments.read_attachment(&attachment.path) {
                    Some(text) if !text.is_empty() => {
                        let _ = write!(content, "\nAttachment ({}):\n{}\n", attachment.name, text);
                    }
                    _ => {
                        tracing::debug!(
                            attachment = %attachment.path,
                            "attachment unavailable, omitting"
                        );
                    }
                }
            }
        }

        let mut metadata = Metadata::new();
        metadata.insert(
            SOURCE_KEY.into(),
            json!(DocumentSource::Execution.as_str()),
        );
        metadata.insert("id".into(), json!(record.uuid));
        metadata.insert(
            "feature".into(),
            json!(record.label("feature").unwrap_or(NO_FEATURE)),
        );
        metadata.insert(
            "story".into(),
            json!(record.label("story").unwrap_or(NO_STORY)),
        );
        metadata.insert(
            "title".into(),
            json!(record.name.as_deref().unwrap_or(NO_TITLE)),
        );

        Document::new(content, metadata)
    }

    /// Build documents for every record, preserving record order.
    pub fn build_all(&self, records: &[ExecutionRecord]) -> Vec<Document> {
        records.iter().map(|r| self.build(r)).collect()
    }
}

/// `"<n>ms"` for a known duration, `"N/A"` otherwise.
pub fn format_duration(duration_ms: Option<i64>) -> String {
    match duration_ms {
        Some(ms) => format!("{}ms", ms),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}
