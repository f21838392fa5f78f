//! Interface specification → documents.
//!
//! Walks `paths → methods → operation` and emits one [`Document`] per
//! `(path, method)` pair. The operation's open-ended JSON sub-trees
//! (parameters, request body, responses) are passed through verbatim as
//! pretty-printed JSON.
//!
//! # Content layout
//!
//! ```text
//! API Path: /tasks/
//! Method: GET
//! Summary: List tasks
//! Description: No description provided
//! Parameters: [ ... ]
//! Request Body: { ... }
//! Responses: { ... }
//! ```
//!
//! Emission order follows the input's key order (the core enables
//! `serde_json/preserve_order`), so identical inputs yield identical output.

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::models::{Document, DocumentSource, InterfaceOperation, Metadata, SOURCE_KEY};

pub const NO_SUMMARY: &str = "No summary provided";
pub const NO_DESCRIPTION: &str = "No description provided";

/// Path-item keys that name operations. Everything else under a path
/// (`parameters`, `servers`, `$ref`, `x-*`, …) is shared path data.
const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Builds spec documents from a parsed interface specification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecDocumentBuilder;

impl SpecDocumentBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build one document per `(path, method)` pair.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedSpec`] when `paths` is missing or not a mapping.
    /// Entries under `paths` that are not mappings (such as `x-*`
    /// extensions) and operations that are not mappings produce no document.
    pub fn build(&self, specification: &Value) -> Result<Vec<Document>> {
        let paths = specification
            .get("paths")
            .ok_or_else(|| Error::MalformedSpec("missing top-level \"paths\"".to_string()))?
            .as_object()
            .ok_or_else(|| Error::MalformedSpec("\"paths\" is not a mapping".to_string()))?;

        let mut documents = Vec::new();
        for (path, item) in paths {
            let Some(methods) = item.as_object() else {
                tracing::debug!(path = %path, "skipping non-mapping path entry");
                continue;
            };

            for (method, op) in methods {
                if !is_http_method(method) {
                    continue;
                }
                let Some(op) = op.as_object() else {
                    tracing::debug!(path = %path, method = %method, "skipping non-mapping operation");
                    continue;
                };
                let operation = InterfaceOperation::from_object(path, method, op);
                documents.push(render_operation(&operation));
            }
        }

        tracing::debug!(documents = documents.len(), "built spec documents");
        Ok(documents)
    }
}

fn is_http_method(key: &str) -> bool {
    HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(key))
}

/// Render a single operation into its document.
pub fn render_operation(op: &InterfaceOperation) -> Document {
    let content = format!(
        "API Path: {}\nMethod: {}\nSummary: {}\nDescription: {}\nParameters: {}\nRequest Body: {}\nResponses: {}\n",
        op.path,
        op.method.to_uppercase(),
        op.summary.as_deref().unwrap_or(NO_SUMMARY),
        op.description.as_deref().unwrap_or(NO_DESCRIPTION),
        pretty(&op.parameters),
        pretty(&op.request_body),
        pretty(&op.responses),
    );

    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.into(), json!(DocumentSource::Spec.as_str()));
    metadata.insert("path".into(), json!(op.path));
    metadata.insert("method".into(), json!(op.method));

    Document::new(content, metadata)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks_spec() -> Value {
        json!({
            "openapi": "3.1.0",
            "paths": {
                "/tasks/": {
                    "get": {
                        "summary": "Read Tasks",
                        "responses": {"200": {"description": "Successful Response"}}
                    },
                    "post": {
                        "summary": "Create Task",
                        "description": "Create a new task",
                        "requestBody": {
                            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Task"}}},
                            "required": true
                        },
                        "responses": {"200": {"description": "Successful Response"}}
                    }
                }
            }
        })
    }

    #[test]
    fn test_one_document_per_path_method() {
        let docs = SpecDocumentBuilder::new().build(&tasks_spec()).unwrap();
        assert_eq!(docs.len(), 2);

        let get = docs[0].metadata();
        assert_eq!(get.get("source"), Some(&json!("spec")));
        assert_eq!(get.get("path"), Some(&json!("/tasks/")));
        assert_eq!(get.get("method"), Some(&json!("get")));
        assert_eq!(docs[1].metadata().get("method"), Some(&json!("post")));
    }

    #[test]
    fn test_content_field_order_and_defaults() {
        let docs = SpecDocumentBuilder::new().build(&tasks_spec()).unwrap();
        let get = docs[0].content();

        assert!(get.starts_with("API Path: /tasks/\nMethod: GET\nSummary: Read Tasks\n"));
        assert!(get.contains("Description: No description provided"));
        assert!(get.contains("Parameters: []"));
        assert!(get.contains("Request Body: {}"));

        let positions: Vec<usize> = [
            "API Path:",
            "Method:",
            "Summary:",
            "Description:",
            "Parameters:",
            "Request Body:",
            "Responses:",
        ]
        .iter()
        .map(|label| get.find(label).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_summary_uses_default() {
        let spec = json!({"paths": {"/health": {"get": {}}}});
        let docs = SpecDocumentBuilder::new().build(&spec).unwrap();
        assert!(docs[0].content().contains("Summary: No summary provided"));
        assert!(docs[0].content().contains("Responses: {}"));
    }

    #[test]
    fn test_request_body_serialized_verbatim() {
        let docs = SpecDocumentBuilder::new().build(&tasks_spec()).unwrap();
        let post = docs[1].content();
        assert!(post.contains("\"$ref\": \"#/components/schemas/Task\""));
        assert!(post.contains("\"required\": true"));
    }

    #[test]
    fn test_missing_paths_is_malformed() {
        let err = SpecDocumentBuilder::new().build(&json!({})).unwrap_err();
        assert!(matches!(err, Error::MalformedSpec(_)));
    }

    #[test]
    fn test_non_mapping_paths_is_malformed() {
        let err = SpecDocumentBuilder::new()
            .build(&json!({"paths": ["/tasks/"]}))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSpec(_)));
    }

    #[test]
    fn test_non_mapping_entries_are_skipped() {
        let spec = json!({
            "paths": {
                "x-internal": true,
                "/tasks/": {"get": {}, "post": "nope"}
            }
        });
        let docs = SpecDocumentBuilder::new().build(&spec).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata_str("path"), Some("/tasks/"));
        assert_eq!(docs[0].metadata_str("method"), Some("get"));
    }

    #[test]
    fn test_path_level_keys_are_not_operations() {
        let spec = json!({
            "paths": {
                "/tasks/{task_id}/": {
                    "parameters": [{"name": "task_id", "in": "path"}],
                    "summary": "Single task",
                    "get": {"summary": "Read Task"},
                    "DELETE": {"summary": "Delete Task"}
                }
            }
        });
        let docs = SpecDocumentBuilder::new().build(&spec).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[1].content().contains("Method: DELETE"));
    }

    #[test]
    fn test_empty_paths_yields_no_documents() {
        let docs = SpecDocumentBuilder::new()
            .build(&json!({"paths": {}}))
            .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_emission_order_follows_input() {
        let spec: Value = serde_json::from_str(
            r#"{"paths": {"/z": {"post": {}}, "/a": {"get": {}, "delete": {}}}}"#,
        )
        .unwrap();
        let docs = SpecDocumentBuilder::new().build(&spec).unwrap();
        let pairs: Vec<(&str, &str)> = docs
            .iter()
            .map(|d| {
                (
                    d.metadata_str("path").unwrap(),
                    d.metadata_str("method").unwrap(),
                )
            })
            .collect();
        assert_eq!(pairs, vec![("/z", "post"), ("/a", "get"), ("/a", "delete")]);
    }
}
