//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Corpus and index locations
    pub paths: PathsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Prompt template settings
    pub prompt: PromptConfig,
    /// Generative model configuration
    pub generation: GenerationConfig,
    /// Local Ollama server
    pub ollama: OllamaConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file; missing keys fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("invalid config: {}", e)))
    }

    /// Check parameter consistency. Runs before any I/O.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than 0"));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be strictly less than chunking.chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.chunk_size > self.embeddings.max_input_chars {
            return Err(Error::config(format!(
                "chunking.chunk_size ({}) exceeds the embedding model input limit ({})",
                c.chunk_size, self.embeddings.max_input_chars
            )));
        }

        let e = &self.embeddings;
        if e.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than 0"));
        }
        if e.batch_size == 0 || e.parallel_batches == 0 {
            return Err(Error::config(
                "embeddings.batch_size and embeddings.parallel_batches must be at least 1",
            ));
        }
        if e.timeout_secs == 0 {
            return Err(Error::config("embeddings.timeout_secs must be greater than 0"));
        }

        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be at least 1"));
        }

        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(Error::config(format!(
                "generation.temperature ({}) must be within 0.0..=2.0",
                g.temperature
            )));
        }
        if g.timeout_secs == 0 {
            return Err(Error::config("generation.timeout_secs must be greater than 0"));
        }
        if g.model.trim().is_empty() || e.model.trim().is_empty() {
            return Err(Error::config("model identifiers must not be empty"));
        }

        if self.prompt.fallback_phrase.trim().is_empty() {
            return Err(Error::config("prompt.fallback_phrase must not be empty"));
        }
        if self.prompt.max_prompt_chars == 0 {
            return Err(Error::config("prompt.max_prompt_chars must be greater than 0"));
        }

        Ok(())
    }
}

/// Corpus and index locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of handbook documents
    pub corpus_dir: PathBuf,
    /// Directory holding the persisted vector index
    pub index_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("vectorstore").join("db_index"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum passage length in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive passages
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 70,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama server (`/api/embeddings`)
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces vectors
    pub provider: EmbeddingBackend,
    /// Model identifier
    pub model: String,
    /// Output dimensionality (768 for nomic-embed-text / mpnet, 384 for MiniLM)
    pub dimensions: usize,
    /// Longest text the model accepts, in characters
    pub max_input_chars: usize,
    /// Passages per embedding batch during ingestion
    pub batch_size: usize,
    /// Batches embedded concurrently during ingestion
    pub parallel_batches: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a failed request
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            max_input_chars: 2048,
            batch_size: 16,
            parallel_batches: 4,
            timeout_secs: 60,
            max_retries: 1,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Prompt template settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Phrase the model must use when the context has no answer
    pub fallback_phrase: String,
    /// Input budget of the generative model, in characters
    pub max_prompt_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            fallback_phrase: "I do not have official information on this.".to_string(),
            max_prompt_chars: 30_000,
        }
    }
}

/// Generative backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// Google Gemini (Generative Language API)
    #[default]
    Gemini,
    /// Ollama server (`/api/generate`)
    Ollama,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Which backend generates answers
    pub provider: GenerationBackend,
    /// Model identifier
    pub model: String,
    /// Sampling temperature, fixed across retries
    pub temperature: f32,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a transient failure
    pub max_retries: u32,
    /// Gemini REST endpoint root
    pub gemini_base_url: String,
    /// Environment variable holding the Gemini API key
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationBackend::Gemini,
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.3, // Low for factual accuracy
            timeout_secs: 60,
            max_retries: 1,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
        }
    }
}
