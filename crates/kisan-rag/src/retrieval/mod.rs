//! Query-time retrieval over the persisted index

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::VectorIndex;
use crate::providers::EmbeddingProvider;
use crate::types::RetrievalResult;

/// Embeds queries and searches a shared read-only index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    /// Pair an embedder with an index of the same dimensionality
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<VectorIndex>) -> Result<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: index.dimensions(),
                actual: embedder.dimensions(),
            });
        }
        if embedder.model_id() != index.model_id() {
            tracing::warn!(
                "Index was built with '{}' but queries use '{}'; rebuild the index if results look wrong",
                index.model_id(),
                embedder.model_id()
            );
        }

        Ok(Self { embedder, index })
    }

    /// Top-k passages for a question
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let query = truncate_chars(query, self.embedder.max_input_chars());
        let vector = self.embedder.embed(query).await?;
        let result = self.index.search(&vector, k)?;

        tracing::debug!(
            "Retrieved {} passages (top score {:.3})",
            result.len(),
            result.top().map(|h| h.score).unwrap_or(0.0)
        );
        Ok(result)
    }
}

/// Longest prefix of at most `max_chars` characters
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
