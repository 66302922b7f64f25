//! Recursive text chunking with fixed overlap

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Document, Passage};

/// Break candidates, highest priority first. A passage ends right after the
/// last separator of the highest level found in its window.
const SEPARATOR_LEVELS: &[&[&str]] = &[
    // paragraph
    &["\n\n"],
    // line
    &["\n"],
    // sentence
    &[". ", "! ", "? ", "। "],
    // whitespace
    &[" ", "\t"],
];

/// Splits documents into passages of at most `chunk_size` characters,
/// consecutive passages sharing exactly `chunk_overlap` characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Vec<Vec<char>>>,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be strictly less than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        let separators = SEPARATOR_LEVELS
            .iter()
            .map(|level| level.iter().map(|sep| sep.chars().collect()).collect())
            .collect();

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk a document, each passage inheriting its source
    pub fn chunk(&self, doc: &Document) -> Vec<Passage> {
        let chars: Vec<char> = doc.text.chars().collect();

        self.split_ranges(&chars)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Passage {
                text: chars[start..end].iter().collect(),
                source: doc.source.clone(),
                chunk_index: i as u32,
                char_start: start,
                char_end: end,
            })
            .collect()
    }

    /// Split text into passage strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        self.split_ranges(&chars)
            .into_iter()
            .map(|(start, end)| chars[start..end].iter().collect())
            .collect()
    }

    /// Character ranges of passages
    fn split_ranges(&self, chars: &[char]) -> Vec<(usize, usize)> {
        let len = chars.len();
        let mut ranges = Vec::new();
        if len == 0 {
            return ranges;
        }

        let mut start = 0;
        loop {
            if len - start <= self.chunk_size {
                ranges.push((start, len));
                break;
            }
            let end = self.find_break(chars, start);
            ranges.push((start, end));
            start = end - self.chunk_overlap;
        }

        ranges
    }

    /// End of the passage starting at `start`. Always in
    /// `(start + chunk_overlap, start + chunk_size]` so the next start advances.
    fn find_break(&self, chars: &[char], start: usize) -> usize {
        let lo = start + self.chunk_overlap + 1;
        let hi = start + self.chunk_size;

        for level in &self.separators {
            for end in (lo..=hi).rev() {
                if level.iter().any(|sep| ends_with_at(chars, end, sep)) {
                    return end;
                }
            }
        }

        hi
    }
}

fn ends_with_at(chars: &[char], end: usize, sep: &[char]) -> bool {
    end >= sep.len() && &chars[end - sep.len()..end] == sep
}
