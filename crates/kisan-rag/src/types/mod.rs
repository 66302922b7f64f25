//! Core types for the RAG system

pub mod document;
pub mod response;

pub use document::{Document, FileType, Passage, RetrievalResult, ScoredPassage, SourceRef};
pub use response::{Answer, Citation, QueryResponse};
