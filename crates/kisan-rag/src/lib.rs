//! kisan-rag: Agricultural advisory RAG over handbook documents
//!
//! Handbooks (PDF, text, markdown) are chunked, embedded and stored in a flat
//! vector index. Questions are answered by retrieving the closest passages and
//! asking a generative model to answer from them only, with source citations.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::VectorIndex;
pub use ingestion::{IngestPipeline, IngestReport};
pub use pipeline::{PipelineHandle, RagPipeline};
pub use types::{Answer, Citation, Passage, QueryResponse, RetrievalResult, SourceRef};
