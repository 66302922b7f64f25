//! Flat exact-search vector index

use crate::error::{Error, Result};
use crate::providers::embedding::{ensure_dimensions, ensure_finite, l2_normalize};
use crate::types::{Passage, RetrievalResult, ScoredPassage};

/// One indexed passage and its embedding
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub passage: Passage,
}

impl IndexEntry {
    pub fn new(vector: Vec<f32>, passage: Passage) -> Self {
        Self { vector, passage }
    }
}

/// In-memory index of normalised vectors; immutable once built
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimensions: usize,
    model_id: String,
    /// Row-major, `len * dimensions` values
    vectors: Vec<f32>,
    passages: Vec<Passage>,
}

impl VectorIndex {
    /// Build an index, normalising every vector. Vectors with NaN or
    /// infinite components are rejected.
    pub fn build(
        dimensions: usize,
        model_id: impl Into<String>,
        entries: Vec<IndexEntry>,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("vector index dimensionality must be greater than 0"));
        }

        let mut vectors = Vec::with_capacity(entries.len() * dimensions);
        let mut passages = Vec::with_capacity(entries.len());

        for entry in entries {
            ensure_dimensions(&entry.vector, dimensions)?;
            ensure_finite(&entry.vector)?;
            let mut vector = entry.vector;
            l2_normalize(&mut vector);
            vectors.extend_from_slice(&vector);
            passages.push(entry.passage);
        }

        Ok(Self {
            dimensions,
            model_id: model_id.into(),
            vectors,
            passages,
        })
    }

    /// Reassemble from stored parts; vectors are assumed normalised
    pub(crate) fn from_parts(
        dimensions: usize,
        model_id: String,
        vectors: Vec<f32>,
        passages: Vec<Passage>,
    ) -> Self {
        Self {
            dimensions,
            model_id,
            vectors,
            passages,
        }
    }

    /// Top-k passages by cosine similarity. Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        ensure_dimensions(query, self.dimensions)?;
        ensure_finite(query)?;
        if k == 0 || self.passages.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimensions)
            .map(|row| row.iter().zip(&query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let hits = scored
            .into_iter()
            .enumerate()
            .map(|(i, (idx, score))| ScoredPassage {
                rank: i + 1,
                score,
                passage: self.passages[idx].clone(),
            })
            .collect();

        Ok(RetrievalResult::new(hits))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embedding model the vectors came from
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }
}
