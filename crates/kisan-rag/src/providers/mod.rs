//! Pluggable providers for embeddings and answer generation
//!
//! Ollama for local embeddings/generation, Gemini for hosted generation,
//! and a hashing embedder that runs fully offline.

pub mod embedding;
pub mod gemini;
pub mod hashing;
pub mod llm;
pub mod ollama;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiGenerator;
pub use hashing::HashingEmbedder;
pub use llm::LlmProvider;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaGenerator};
pub use retry::RetryPolicy;

use crate::config::{EmbeddingBackend, GenerationBackend, RagConfig};
use crate::error::Result;

/// Build the configured embedding provider
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.provider {
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(&config.ollama, &config.embeddings)?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::from_config(&config.embeddings)?),
    };

    tracing::info!(
        "Embedding provider: {} ({}, {} dims)",
        embedder.name(),
        embedder.model_id(),
        embedder.dimensions()
    );
    Ok(embedder)
}

/// Build the configured generative provider
pub fn build_generator(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let g = &config.generation;
    let generator: Arc<dyn LlmProvider> = match g.provider {
        GenerationBackend::Gemini => Arc::new(GeminiGenerator::new(g)?),
        GenerationBackend::Ollama => Arc::new(OllamaGenerator::new(
            &config.ollama,
            g.model.clone(),
            Duration::from_secs(g.timeout_secs),
        )?),
    };

    tracing::info!("LLM provider: {} ({})", generator.name(), generator.model());
    Ok(generator)
}
