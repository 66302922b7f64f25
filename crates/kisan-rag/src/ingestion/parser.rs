//! Pluggable corpus file parsers

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed file with extracted text per page
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Page-level content; a single unnumbered page for flat formats
    pub pages: Vec<PageContent>,
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed), `None` for flat formats
    pub page_number: Option<u32>,
    /// Text content of the page
    pub content: String,
}

/// Extracts text from one family of file formats
pub trait DocumentParser: Send + Sync {
    /// Parser name for logging
    fn name(&self) -> &str;

    /// Whether this parser handles the given file type
    fn supports(&self, file_type: FileType) -> bool;

    /// Extract page-level text from raw file bytes
    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument>;
}

/// PDF parser producing one page of text per PDF page
pub struct PdfParser;

impl DocumentParser for PdfParser {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supports(&self, file_type: FileType) -> bool {
        file_type == FileType::Pdf
    }

    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().into_keys() {
            let content = doc.extract_text(&[page_number]).map_err(|e| {
                Error::file_parse(filename, format!("page {}: {}", page_number, e))
            })?;
            pages.push(PageContent {
                page_number: Some(page_number),
                content,
            });
        }

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            pages,
        })
    }
}

/// Plain text and markdown parser
pub struct TextParser;

impl DocumentParser for TextParser {
    fn name(&self) -> &str {
        "text"
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Txt | FileType::Markdown)
    }

    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let extension = filename.rsplit('.').next().unwrap_or("");
        let content = String::from_utf8_lossy(data).to_string();

        Ok(ParsedDocument {
            file_type: FileType::from_extension(extension),
            pages: vec![PageContent {
                page_number: None,
                content,
            }],
        })
    }
}

/// Registry dispatching files to the parser for their extension
pub struct FileParser {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl FileParser {
    /// Registry with no parsers
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Add a parser; later registrations do not override earlier ones
    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Find the parser responsible for a path, if any
    pub fn parser_for(&self, path: &Path) -> Option<&dyn DocumentParser> {
        let extension = path.extension()?.to_string_lossy();
        let file_type = FileType::from_extension(&extension);
        self.parsers
            .iter()
            .find(|p| p.supports(file_type))
            .map(|p| p.as_ref())
    }

    /// Whether any registered parser handles this path
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.parser_for(path).is_some()
    }

    /// Parse a file based on its extension
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let parser = self
            .parser_for(Path::new(filename))
            .ok_or_else(|| Error::file_parse(filename, "unsupported file type"))?;
        tracing::debug!("Parsing '{}' with {} parser", filename, parser.name());
        parser.parse(filename, data)
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::empty().with_parser(PdfParser).with_parser(TextParser)
    }
}
