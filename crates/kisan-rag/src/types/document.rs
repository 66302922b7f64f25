//! Document and passage types with source tracking for citations

use serde::{Deserialize, Serialize};

/// Supported corpus file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF handbook, one document per page
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }
}

/// Where a piece of text came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// File name of the handbook
    pub source_name: String,
    /// Page number (1-indexed) for paginated formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl SourceRef {
    pub fn new(source_name: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            source_name: source_name.into(),
            page,
        }
    }
}

/// Text loaded from the corpus: a whole file or a single page of one
#[derive(Debug, Clone)]
pub struct Document {
    /// Source information for citations
    pub source: SourceRef,
    /// File type the text was extracted from
    pub file_type: FileType,
    /// Extracted text
    pub text: String,
}

impl Document {
    pub fn new(source: SourceRef, file_type: FileType, text: impl Into<String>) -> Self {
        Self {
            source,
            file_type,
            text: text.into(),
        }
    }
}

/// A bounded slice of a document; the unit of retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Text content
    pub text: String,
    /// Inherited source information
    pub source: SourceRef,
    /// Passage index within its document
    pub chunk_index: u32,
    /// Character range in the document text
    pub char_start: usize,
    pub char_end: usize,
}

/// A retrieved passage with its rank (1-based) and cosine similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub rank: usize,
    pub score: f32,
    pub passage: Passage,
}

/// Top-k passages for a query, descending by score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub fn new(hits: Vec<ScoredPassage>) -> Self {
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredPassage> {
        self.hits.iter()
    }

    /// Highest scoring hit
    pub fn top(&self) -> Option<&ScoredPassage> {
        self.hits.first()
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredPassage;
    type IntoIter = std::slice::Iter<'a, ScoredPassage>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}
