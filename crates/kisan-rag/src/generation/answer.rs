//! Answer generation with timeout and bounded retry

use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::providers::{LlmProvider, RetryPolicy};
use crate::types::{Answer, RetrievalResult};

/// Sampling and retry settings for one generator
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    /// Fixed across retries
    pub temperature: f32,
    pub retry: RetryPolicy,
}

impl GenerationSettings {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            retry: RetryPolicy::new(config.max_retries, Duration::from_secs(config.timeout_secs)),
        }
    }
}

/// Calls the generative model for an assembled prompt
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Generate an answer grounded on `retrieval`
    pub async fn generate(&self, prompt: &str, retrieval: RetrievalResult) -> Result<Answer> {
        tracing::info!(
            "Generating answer with {} ({}), {} passages in context",
            self.llm.name(),
            self.llm.model(),
            retrieval.len()
        );

        let llm = self.llm.as_ref();
        let temperature = self.settings.temperature;
        let text = self
            .settings
            .retry
            .run("Answer generation", Error::generation, move || async move {
                let text = llm.generate(prompt, temperature).await?;
                if text.trim().is_empty() {
                    return Err(Error::generation("model returned an empty answer"));
                }
                Ok(text)
            })
            .await?;

        Ok(Answer {
            text: text.trim().to_string(),
            retrieval,
        })
    }
}
