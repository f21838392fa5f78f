//! Core data models shared by the builders, the index, and the retriever.
//!
//! [`Document`] is the unit of indexing. [`ExecutionRecord`], [`Step`],
//! [`Attachment`] and [`Label`] mirror the on-disk shape of one execution
//! report file and are deserialized directly from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form document metadata, preserved verbatim through the index.
pub type Metadata = Map<String, Value>;

/// Metadata key holding the [`DocumentSource`] label.
pub const SOURCE_KEY: &str = "source";

/// Which input a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSource {
    /// One (path, method) operation of the interface specification.
    Spec,
    /// One completed test execution.
    Execution,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Spec => "spec",
            DocumentSource::Execution => "execution",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "spec" => Some(DocumentSource::Spec),
            "execution" => Some(DocumentSource::Execution),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-contained text record plus its metadata.
///
/// Fields are private: a document is never mutated after it is built, only
/// replaced by rebuilding the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    content: String,
    metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up a metadata value as a string, if present and textual.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// The source this document was built from, if its `source` label is known.
    pub fn source(&self) -> Option<DocumentSource> {
        self.metadata_str(SOURCE_KEY).and_then(DocumentSource::parse)
    }
}

/// A document paired with its similarity to a query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// One `(path, method)` entry of the interface specification.
///
/// Constructed transiently while walking the specification; only the
/// derived [`Document`] outlives it.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceOperation {
    pub path: String,
    pub method: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Value,
    pub request_body: Value,
    pub responses: Value,
}

impl InterfaceOperation {
    /// Extract the fields of an operation object. Absent fields fall back to
    /// empty JSON values; nothing here is an error.
    pub fn from_object(path: &str, method: &str, op: &Map<String, Value>) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            summary: op.get("summary").map(value_text),
            description: op.get("description").map(value_text),
            parameters: op
                .get("parameters")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            request_body: op
                .get("requestBody")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            responses: op
                .get("responses")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A `(name, value)` label attached to an execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Label {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A reference to auxiliary file content captured during a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub name: String,
    /// Path of the attachment file, relative to the results directory.
    #[serde(rename = "source")]
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One step of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Step {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Step {
    pub fn duration_ms(&self) -> Option<i64> {
        duration_ms(self.start, self.stop)
    }
}

/// One completed test run, as recorded in a result file.
///
/// `status` is an open label set (`passed`, `failed`, `broken`, `skipped`,
/// or anything else the recorder emits), so it stays a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub stop: Option<i64>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ExecutionRecord {
    pub fn duration_ms(&self) -> Option<i64> {
        duration_ms(self.start, self.stop)
    }

    /// Value of the first label named `name`.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

/// `stop - start`, or `None` when either bound is missing or the interval
/// would be negative or overflow.
pub fn duration_ms(start: Option<i64>, stop: Option<i64>) -> Option<i64> {
    match (start, stop) {
        (Some(start), Some(stop)) if stop >= start => stop.checked_sub(start),
        _ => None,
    }
}
