//! Corpus ingestion: loading, parsing, chunking and index building

mod chunker;
mod loader;
mod parser;
mod processor;

pub use chunker::TextChunker;
pub use loader::{CorpusLoader, Documents};
pub use parser::{DocumentParser, FileParser, PageContent, ParsedDocument, PdfParser, TextParser};
pub use processor::{IngestPipeline, IngestReport};
