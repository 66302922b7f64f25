//! Ollama client for embeddings and answer generation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, OllamaConfig};
use crate::error::{Error, Result};

use super::embedding::{ensure_dimensions, ensure_within_limit, EmbeddingProvider};
use super::llm::LlmProvider;
use super::retry::RetryPolicy;

/// Thin Ollama API client; each call is a single attempt
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a client; `timeout` bounds every HTTP request
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Embed one text
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("embedding request failed: {}", e)))?;
        let response =
            check_status(response, "Embedding", Error::embedding, Error::embedding_rejected)
                .await?;

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("failed to parse embedding response: {}", e)))?;

        if embed_response.embedding.is_empty() {
            return Err(Error::embedding(format!(
                "model '{}' returned an empty embedding",
                model
            )));
        }
        Ok(embed_response.embedding)
    }

    /// Generate a completion
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("generation request failed: {}", e)))?;
        let response =
            check_status(response, "Generation", Error::generation, Error::generation_rejected)
                .await?;

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("failed to parse generation response: {}", e)))?;

        Ok(generate_response.response)
    }
}

/// Server-side and rate-limit failures are retryable; other rejections
/// (unknown model, bad request) are final
async fn check_status(
    response: Response,
    what: &str,
    transient: fn(String) -> Error,
    rejected: fn(String) -> Error,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = format!("{} failed: HTTP {} - {}", what, status, body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(transient(message))
    } else {
        Err(rejected(message))
    }
}

/// Embeddings from a local Ollama model
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimensions: usize,
    max_input_chars: usize,
    retry: RetryPolicy,
}

impl OllamaEmbedder {
    pub fn new(ollama: &OllamaConfig, config: &EmbeddingConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: OllamaClient::new(ollama, timeout)?,
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_input_chars: config.max_input_chars,
            retry: RetryPolicy::new(config.max_retries, timeout),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_within_limit(text, self.max_input_chars)?;

        let client = &self.client;
        let model = self.model.as_str();
        let embedding = self
            .retry
            .run("Ollama embedding", Error::embedding, move || client.embed(model, text))
            .await?;

        ensure_dimensions(&embedding, self.dimensions)?;
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Answers from a local Ollama model
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
}

impl OllamaGenerator {
    pub fn new(ollama: &OllamaConfig, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: OllamaClient::new(ollama, timeout)?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.client.generate(&self.model, prompt, temperature).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
