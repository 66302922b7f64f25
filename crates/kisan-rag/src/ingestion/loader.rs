//! Corpus directory loader

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Document, SourceRef};

use super::parser::FileParser;

/// Reads handbook files from a corpus directory
pub struct CorpusLoader {
    corpus_dir: PathBuf,
    parser: FileParser,
}

impl CorpusLoader {
    /// Create a loader with the default PDF/text parsers
    pub fn new(corpus_dir: impl Into<PathBuf>) -> Self {
        Self::with_parser(corpus_dir, FileParser::default())
    }

    /// Create a loader with a custom parser registry
    pub fn with_parser(corpus_dir: impl Into<PathBuf>, parser: FileParser) -> Self {
        Self {
            corpus_dir: corpus_dir.into(),
            parser,
        }
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Eligible files in sorted path order
    pub fn eligible_files(&self) -> Result<Vec<PathBuf>> {
        if !self.corpus_dir.is_dir() {
            return Err(Error::CorpusNotFound(self.corpus_dir.clone()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && self.parser.is_eligible(path) {
                files.push(path.to_path_buf());
            }
        }

        if files.is_empty() {
            tracing::warn!(
                "No eligible documents in {}; add PDF or text handbooks there",
                self.corpus_dir.display()
            );
            return Err(Error::EmptyCorpus(self.corpus_dir.clone()));
        }

        Ok(files)
    }

    /// Lazily parse the corpus, one file at a time
    pub fn load(&self) -> Result<Documents<'_>> {
        let files = self.eligible_files()?;
        tracing::info!(
            "Loading {} files from {}",
            files.len(),
            self.corpus_dir.display()
        );

        Ok(Documents {
            loader: self,
            files: files.into(),
            pending: VecDeque::new(),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<Document>> {
        let source_name = path
            .strip_prefix(&self.corpus_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let data = std::fs::read(path)?;
        let parsed = self.parser.parse(&source_name, &data)?;

        let documents: Vec<Document> = parsed
            .pages
            .into_iter()
            .filter(|page| !page.content.trim().is_empty())
            .map(|page| {
                Document::new(
                    SourceRef::new(source_name.clone(), page.page_number),
                    parsed.file_type,
                    page.content,
                )
            })
            .collect();

        if documents.is_empty() {
            tracing::warn!("'{}' contains no extractable text", source_name);
        } else {
            tracing::debug!("'{}' yielded {} documents", source_name, documents.len());
        }

        Ok(documents)
    }
}

/// Lazy sequence of documents from a corpus
pub struct Documents<'a> {
    loader: &'a CorpusLoader,
    files: VecDeque<PathBuf>,
    pending: VecDeque<Document>,
}

impl Iterator for Documents<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.pending.pop_front() {
                return Some(Ok(doc));
            }
            let path = self.files.pop_front()?;
            match self.loader.read_file(&path) {
                Ok(docs) => self.pending.extend(docs),
                Err(e) => {
                    // Parse failures end the sequence
                    self.files.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}
