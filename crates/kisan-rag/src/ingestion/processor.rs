//! Ingestion pipeline orchestration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::index::{IndexEntry, VectorIndex};
use crate::providers::EmbeddingProvider;
use crate::types::Passage;

use super::chunker::TextChunker;
use super::loader::CorpusLoader;

/// Summary of a completed ingestion
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub documents: usize,
    pub passages: usize,
    pub dimensions: usize,
    pub model_id: String,
    pub index_dir: PathBuf,
    pub elapsed: Duration,
}

/// Load → chunk → embed → build → persist
pub struct IngestPipeline {
    corpus_dir: PathBuf,
    index_dir: PathBuf,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    parallel_batches: usize,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        config.validate()?;
        let chunker = TextChunker::from_config(&config.chunking)?;

        if chunker.chunk_size() > embedder.max_input_chars() {
            return Err(Error::config(format!(
                "chunk_size ({}) exceeds the input limit of embedder '{}' ({})",
                chunker.chunk_size(),
                embedder.name(),
                embedder.max_input_chars()
            )));
        }

        Ok(Self {
            corpus_dir: config.paths.corpus_dir.clone(),
            index_dir: config.paths.index_dir.clone(),
            chunker,
            embedder,
            batch_size: config.embeddings.batch_size,
            parallel_batches: config.embeddings.parallel_batches,
        })
    }

    /// Rebuild the index from the corpus. Nothing is written unless every
    /// step succeeds.
    pub async fn run(&self) -> Result<IngestReport> {
        let started = Instant::now();
        tracing::info!(
            "Ingesting {} into {}",
            self.corpus_dir.display(),
            self.index_dir.display()
        );

        let (documents, passages) = self.load_and_chunk().await?;
        if documents == 0 {
            tracing::warn!(
                "No extractable text in {}; index not written",
                self.corpus_dir.display()
            );
            return Err(Error::EmptyCorpus(self.corpus_dir.clone()));
        }
        tracing::info!("Split {} documents into {} passages", documents, passages.len());

        let vectors = self.embed_passages(&passages).await?;
        let entries = vectors
            .into_iter()
            .zip(passages)
            .map(|(vector, passage)| IndexEntry::new(vector, passage))
            .collect();

        let index = VectorIndex::build(
            self.embedder.dimensions(),
            self.embedder.model_id(),
            entries,
        )?;
        index.persist(&self.index_dir)?;

        let report = IngestReport {
            documents,
            passages: index.len(),
            dimensions: index.dimensions(),
            model_id: index.model_id().to_string(),
            index_dir: self.index_dir.clone(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Ingestion complete: {} documents, {} passages in {:.1}s",
            report.documents,
            report.passages,
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    /// Parse and chunk on the blocking pool
    async fn load_and_chunk(&self) -> Result<(usize, Vec<Passage>)> {
        let corpus_dir = self.corpus_dir.clone();
        let chunker = self.chunker.clone();

        tokio::task::spawn_blocking(move || -> Result<(usize, Vec<Passage>)> {
            let loader = CorpusLoader::new(corpus_dir);
            let mut documents = 0;
            let mut passages = Vec::new();

            for doc in loader.load()? {
                let doc = doc?;
                documents += 1;
                passages.extend(chunker.chunk(&doc));
            }

            Ok((documents, passages))
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Embed in batches, several in flight, results in passage order
    async fn embed_passages(&self, passages: &[Passage]) -> Result<Vec<Vec<f32>>> {
        let batches: Vec<Vec<String>> = passages
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|p| p.text.clone()).collect())
            .collect();
        let total = batches.len();
        let embedder = self.embedder.as_ref();

        tracing::info!(
            "Embedding {} passages in {} batches with {}",
            passages.len(),
            total,
            embedder.name()
        );

        let embedded: Vec<Vec<Vec<f32>>> = stream::iter(batches.into_iter().enumerate())
            .map(|(i, texts)| async move {
                let vectors = embedder.embed_batch(&texts).await?;
                if vectors.len() != texts.len() {
                    return Err(Error::embedding(format!(
                        "batch {} returned {} vectors for {} passages",
                        i + 1,
                        vectors.len(),
                        texts.len()
                    )));
                }
                tracing::debug!("Embedded batch {}/{}", i + 1, total);
                Ok::<_, Error>(vectors)
            })
            .buffered(self.parallel_batches)
            .try_collect()
            .await?;

        Ok(embedded.into_iter().flatten().collect())
    }
}
