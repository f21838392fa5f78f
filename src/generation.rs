//! Generative backends.
//!
//! Implementations of [`coverage_harness_core::Generator`]. Each call sends
//! the composed prompt as a single user message and returns the reply text
//! unchanged. There is no streaming and no retry.

use anyhow::bail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use coverage_harness_core::{Error, Generator, Result};

use crate::config::GenerationConfig;

const OPENAI_URL: &str = "https://api.openai.com";
const OLLAMA_URL: &str = "http://localhost:11434";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4";

pub fn create_generator(config: &GenerationConfig) -> anyhow::Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAIGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::generation(
            "generate",
            "Generation provider is disabled (set [generation] provider in config)",
        ))
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

// ============ OpenAI ============

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Chat completions against the OpenAI API (`POST /v1/chat/completions`).
pub struct OpenAIGenerator {
    client: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    temperature: Option<f32>,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &GenerationConfig, api_key: String) -> anyhow::Result<Self> {
        let base_url = config.url.clone().unwrap_or_else(|| OPENAI_URL.to_string());
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        const OP: &str = "chat completion";
        let start = Instant::now();

        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(OP, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(
                OP,
                format!("OpenAI returned {}: {}", status, body),
            ));
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(OP, format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::generation(OP, "Response contained no choices"))?;

        tracing::debug!(
            model = %self.model,
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        Ok(content)
    }
}

// ============ Ollama ============

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Non-streaming chat against an Ollama server (`POST /api/chat`).
pub struct OllamaGenerator {
    client: reqwest::Client,
    model: String,
    base_url: String,
    temperature: Option<f32>,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for Ollama provider"))?;
        let base_url = config.url.clone().unwrap_or_else(|| OLLAMA_URL.to_string());
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        const OP: &str = "ollama chat";
        let start = Instant::now();

        let request = OllamaChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options: self
                .temperature
                .map(|t| serde_json::json!({ "temperature": t })),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(OP, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(
                OP,
                format!("Ollama returned {}: {}", status, body),
            ));
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(OP, format!("Failed to parse response: {}", e)))?;

        let content = result.message.content;
        tracing::debug!(
            model = %self.model,
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(provider: &str, url: &str) -> GenerationConfig {
        GenerationConfig {
            provider: provider.to_string(),
            model: Some("test-model".to_string()),
            url: Some(url.to_string()),
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_fails() {
        let err = DisabledGenerator.generate("hi").await.unwrap_err();
        assert!(matches!(err, Error::GenerationBackend { .. }));
    }

    #[test]
    fn test_openai_defaults_to_gpt4() {
        let cfg = GenerationConfig {
            provider: "openai".to_string(),
            ..GenerationConfig::default()
        };
        let generator = OpenAIGenerator::with_api_key(&cfg, "sk-test".into()).unwrap();
        assert_eq!(generator.model_name(), "gpt-4");
    }

    #[test]
    fn test_ollama_requires_model() {
        let cfg = GenerationConfig {
            provider: "ollama".to_string(),
            ..GenerationConfig::default()
        };
        assert!(create_generator(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_openai_returns_reply_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "PROMPT"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "\n- DELETE /tasks/{id} untested\n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator =
            OpenAIGenerator::with_api_key(&config("openai", &server.uri()), "sk-test".into())
                .unwrap();
        let reply = generator.generate("PROMPT").await.unwrap();
        assert_eq!(reply, "\n- DELETE /tasks/{id} untested\n");
    }

    #[tokio::test]
    async fn test_openai_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let generator =
            OpenAIGenerator::with_api_key(&config("openai", &server.uri()), "sk-bad".into())
                .unwrap();
        let err = generator.generate("PROMPT").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_ollama_chat_non_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "Hello there!"},
                "done": true
            })))
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&config("ollama", &server.uri())).unwrap();
        assert_eq!(generator.generate("hi").await.unwrap(), "Hello there!");
    }
}
