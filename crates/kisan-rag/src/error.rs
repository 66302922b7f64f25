//! Error types for the RAG system

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, detected before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corpus directory does not exist
    #[error("Corpus directory not found: {}", .0.display())]
    CorpusNotFound(PathBuf),

    /// Corpus directory has no eligible documents
    #[error("No documents found in corpus directory: {}", .0.display())]
    EmptyCorpus(PathBuf),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Vector length disagrees with the index or embedder
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted index exists but cannot be decoded
    #[error("Corrupt vector index at {}: {message}", .path.display())]
    CorruptIndex { path: PathBuf, message: String },

    /// Persisted index is absent
    #[error("Vector index not found at {}", .0.display())]
    IndexNotFound(PathBuf),

    /// Embedding provider failure; `retryable` is false when the provider
    /// rejected the request outright
    #[error("Embedding generation failed: {message}")]
    Embedding { message: String, retryable: bool },

    /// Assembled prompt exceeds the generative model's input budget
    #[error("Prompt of {size} characters exceeds the limit of {limit}")]
    ContextTooLarge { size: usize, limit: usize },

    /// Generative provider failure
    #[error("Answer generation failed: {message}")]
    Generation { message: String, retryable: bool },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a retryable embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            retryable: true,
        }
    }

    /// Create an embedding error that retrying cannot fix
    pub fn embedding_rejected(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a retryable generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            retryable: true,
        }
    }

    /// Create a generation error that retrying cannot fix
    pub fn generation_rejected(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a corrupt index error
    pub fn corrupt_index(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Generation { retryable, .. } | Error::Embedding { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Message suitable for showing to the person who asked the question
    pub fn user_message(&self) -> String {
        match self {
            Error::IndexNotFound(_) => {
                "The knowledge base has not been built yet. Run `kisan-rag ingest` first."
                    .to_string()
            }
            Error::CorruptIndex { .. } | Error::DimensionMismatch { .. } => format!(
                "The knowledge base cannot be used ({}). Re-run `kisan-rag ingest` to rebuild it.",
                self
            ),
            Error::ContextTooLarge { .. } => format!(
                "{}. Reduce `retrieval.top_k` or `chunking.chunk_size` and try again.",
                self
            ),
            Error::Generation { .. } => format!(
                "The language model could not produce an answer right now: {}",
                self
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_not_transient() {
        assert!(Error::generation("HTTP 503").is_transient());
        assert!(Error::embedding("connection refused").is_transient());
        assert!(!Error::generation_rejected("HTTP 403").is_transient());
        assert!(!Error::embedding_rejected("HTTP 404").is_transient());
        assert!(!Error::config("bad").is_transient());
    }

    #[test]
    fn test_rejected_generation_message() {
        let err = Error::generation_rejected("Gemini error: HTTP 403 Forbidden");
        assert!(err.user_message().starts_with("The language model could not"));
        assert!(err.to_string().contains("403"));
    }
}
