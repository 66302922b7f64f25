//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
/// - `HashingEmbedder`: Offline feature hashing, no model download
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, same order and length as input.
    /// Any failure fails the whole batch.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Identifier of the model producing the vectors
    fn model_id(&self) -> &str;

    /// Longest accepted input, in characters
    fn max_input_chars(&self) -> usize;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject texts the model cannot take; callers truncate beforehand
pub fn ensure_within_limit(text: &str, max_input_chars: usize) -> Result<()> {
    let len = text.chars().count();
    if len > max_input_chars {
        return Err(Error::embedding_rejected(format!(
            "input of {} characters exceeds the model limit of {}",
            len, max_input_chars
        )));
    }
    Ok(())
}

/// Reject vectors of the wrong length
pub fn ensure_dimensions(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Reject vectors holding NaN or infinite components
pub fn ensure_finite(vector: &[f32]) -> Result<()> {
    if let Some(position) = vector.iter().position(|x| !x.is_finite()) {
        return Err(Error::embedding_rejected(format!(
            "vector component {} is not finite ({})",
            position, vector[position]
        )));
    }
    Ok(())
}

/// Scale a vector to unit length; zero vectors are left unchanged
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vector.iter_mut() {
            *val /= norm;
        }
    }
}
