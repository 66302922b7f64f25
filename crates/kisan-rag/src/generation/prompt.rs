//! Grounding prompt for the agricultural advisor

use crate::config::PromptConfig;
use crate::error::{Error, Result};
use crate::types::RetrievalResult;

/// Builds the single prompt sent to the generative model
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    config: PromptConfig,
}

impl PromptAssembler {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Context block: passages in rank order, each tagged with its source
    pub fn build_context(retrieval: &RetrievalResult) -> String {
        let mut context = String::new();

        for hit in retrieval {
            let source = &hit.passage.source;
            context.push_str(&format!("[{}] Source: {}", hit.rank, source.source_name));
            if let Some(page) = source.page {
                context.push_str(&format!(", Page {}", page));
            }
            context.push('\n');
            context.push_str(hit.passage.text.trim());
            context.push_str("\n\n");
        }

        context
    }

    /// Combine retrieved passages and the question under the fixed template
    pub fn assemble(&self, question: &str, retrieval: &RetrievalResult) -> Result<String> {
        let context = Self::build_context(retrieval);

        let prompt = format!(
            r#"You are 'Kisan Sahayak', an expert agricultural advisor for Indian farmers.
Use the context below to answer the farmer's question.

Guidelines:
1. Answer primarily in the language of the question (Hindi/English).
2. If the answer is not in the context, say "{fallback}"
3. Cite the source document name where possible, e.g. [Source: name, Page N].

Context:
{context}
Question: {question}

Answer:
"#,
            fallback = self.config.fallback_phrase,
            context = context,
            question = question.trim(),
        );

        let size = prompt.chars().count();
        if size > self.config.max_prompt_chars {
            return Err(Error::ContextTooLarge {
                size,
                limit: self.config.max_prompt_chars,
            });
        }

        Ok(prompt)
    }
}
