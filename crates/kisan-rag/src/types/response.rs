//! Answer and response types

use serde::{Deserialize, Serialize};

use super::document::{RetrievalResult, ScoredPassage};

/// Citation of a retrieved passage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Retrieval rank (1-based)
    pub rank: usize,
    /// Source file name
    pub source_name: String,
    /// Page number, when the source is paginated
    pub page: Option<u32>,
    /// Similarity score of the cited passage
    pub similarity_score: f32,
}

impl Citation {
    /// Create a citation from a scored passage
    pub fn from_hit(hit: &ScoredPassage) -> Self {
        Self {
            rank: hit.rank,
            source_name: hit.passage.source.source_name.clone(),
            page: hit.passage.source.page,
            similarity_score: hit.score,
        }
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        match self.page {
            Some(page) => format!("[Source: {}, Page {}]", self.source_name, page),
            None => format!("[Source: {}]", self.source_name),
        }
    }

    /// `Source: name | Page: n` line used by the CLI
    pub fn format_caption(&self) -> String {
        let page = self
            .page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!("Source: {} | Page: {}", self.source_name, page)
    }
}

/// Generated text plus the retrieval it was grounded on
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub retrieval: RetrievalResult,
}

impl Answer {
    /// Citations in retrieval-rank order
    pub fn citations(&self) -> Vec<Citation> {
        self.retrieval.iter().map(Citation::from_hit).collect()
    }
}

/// Outcome of a question, always renderable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer; empty on failure
    pub answer: String,
    /// Sources of the passages the answer was grounded on
    pub citations: Vec<Citation>,
    /// Human-readable failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    pub fn success(answer: &Answer, processing_time_ms: u64) -> Self {
        Self {
            answer: answer.text.clone(),
            citations: answer.citations(),
            error: None,
            processing_time_ms,
        }
    }

    pub fn failure(message: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            answer: String::new(),
            citations: Vec::new(),
            error: Some(message.into()),
            processing_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Passage, SourceRef};

    fn hit(rank: usize, page: Option<u32>) -> ScoredPassage {
        ScoredPassage {
            rank,
            score: 0.5,
            passage: Passage {
                text: "Sow wheat in November.".to_string(),
                source: SourceRef::new("wheat.pdf", page),
                chunk_index: 0,
                char_start: 0,
                char_end: 22,
            },
        }
    }

    #[test]
    fn test_citation_formats() {
        let with_page = Citation::from_hit(&hit(1, Some(4)));
        assert_eq!(with_page.format_inline(), "[Source: wheat.pdf, Page 4]");
        assert_eq!(with_page.format_caption(), "Source: wheat.pdf | Page: 4");

        let without_page = Citation::from_hit(&hit(2, None));
        assert_eq!(without_page.format_inline(), "[Source: wheat.pdf]");
        assert_eq!(without_page.format_caption(), "Source: wheat.pdf | Page: N/A");
    }

    #[test]
    fn test_failure_response_has_no_answer() {
        let response = QueryResponse::failure("index missing", 3);
        assert!(!response.is_success());
        assert!(response.answer.is_empty());
        assert!(response.citations.is_empty());
    }
}
