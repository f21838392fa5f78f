//! Retrieval-augmented coverage analysis.
//!
//! [`CoverageAnalysisEngine`] retrieves a balanced context for a query,
//! composes it with a system directive into one prompt, and hands that prompt
//! to a [`Generator`]. Every call is independent: no conversation history is
//! kept. Callers wanting multi-turn context pass prior turns inside `query`.
//!
//! Prompt shape:
//!
//! ```text
//! <system directive>
//!
//! Context:
//! <doc 1>
//!
//! <doc 2>
//!
//! <query>
//! ```

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::retrieve::{BalancedRetriever, Retrieved};

/// An opaque prompt → text capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4"`).
    fn model_name(&self) -> &str;
    /// Run one completion. Failures are [`Error::GenerationBackend`]; no retries.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Directive used when the caller does not supply one.
pub const DEFAULT_SYSTEM_DIRECTIVE: &str = "You are a Senior Test Analyst with extensive experience in test design, coverage analysis, and quality assurance. Your task is to analyze the test coverage, efficiency, and completeness of the existing test suite based on the following combined context:

1. API Specification: Review the API models, endpoints, and operations described in the interface specification.
2. Test Execution Results: Review the existing test results, including the steps, assertions, and any linked attachments.
3. Combined Analysis: Cross-reference the specification with the test results to determine if all API endpoints are adequately tested.
4. Test Efficiency: Evaluate the efficiency of the existing tests.
5. Missed Steps Identification: Identify any untested scenarios or missed steps based on the API models and the actual test results.
6. Additional Coverage Suggestions: Recommend additional test cases that could enhance coverage.
7. Test Design Best Practices: Explain the rationale behind each recommendation and how it aligns with best test design practices.";

/// Compose the single prompt sent to the generator.
pub fn compose_prompt(system_directive: &str, context: &str, query: &str) -> String {
    format!("{}\n\nContext:\n{}\n\n{}", system_directive, context, query)
}

/// Stateless request/response analysis over a retrieved context.
pub struct CoverageAnalysisEngine<'a> {
    retriever: BalancedRetriever<'a>,
    generator: &'a dyn Generator,
    k: usize,
}

impl<'a> CoverageAnalysisEngine<'a> {
    pub fn new(retriever: BalancedRetriever<'a>, generator: &'a dyn Generator, k: usize) -> Self {
        Self {
            retriever,
            generator,
            k,
        }
    }

    /// Retrieve context for `query` and return the generator's answer verbatim.
    pub async fn answer(&self, system_directive: &str, query: &str) -> Result<String> {
        self.answer_as("answer", system_directive, query).await
    }

    /// Answer using an already-retrieved context; performs no retrieval.
    pub async fn answer_with_context(
        &self,
        system_directive: &str,
        query: &str,
        retrieved: &Retrieved,
    ) -> Result<String> {
        self.generate_as("answer", system_directive, query, retrieved)
            .await
    }

    /// Coverage analysis entry point. Same contract as [`answer`](Self::answer).
    pub async fn analyze_coverage(&self, system_directive: &str, query: &str) -> Result<String> {
        self.answer_as("analyze coverage", system_directive, query)
            .await
    }

    /// Test generation entry point. Same contract as [`answer`](Self::answer).
    pub async fn generate_tests(&self, system_directive: &str, query: &str) -> Result<String> {
        self.answer_as("generate tests", system_directive, query)
            .await
    }

    async fn answer_as(
        &self,
        operation: &str,
        system_directive: &str,
        query: &str,
    ) -> Result<String> {
        let retrieved = self.retriever.retrieve(query, self.k).await?;
        self.generate_as(operation, system_directive, query, &retrieved)
            .await
    }

    async fn generate_as(
        &self,
        operation: &str,
        system_directive: &str,
        query: &str,
        retrieved: &Retrieved,
    ) -> Result<String> {
        let prompt = compose_prompt(system_directive, &retrieved.context(), query);
        tracing::debug!(
            operation,
            model = self.generator.model_name(),
            context_docs = retrieved.len(),
            prompt_len = prompt.len(),
            "invoking generator"
        );

        self.generator.generate(&prompt).await.map_err(|e| match e {
            Error::GenerationBackend { message, .. } => Error::generation(operation, message),
            other => other,
        })
    }
}
