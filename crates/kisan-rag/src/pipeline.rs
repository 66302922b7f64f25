//! Online question answering: retrieve, assemble, generate

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerGenerator, GenerationSettings, PromptAssembler};
use crate::index::VectorIndex;
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::Retriever;
use crate::types::{Answer, QueryResponse};

/// Loaded index plus the components needed to answer questions
pub struct RagPipeline {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: AnswerGenerator,
    top_k: usize,
}

impl RagPipeline {
    /// Build providers from config and load the persisted index
    pub async fn open(config: &RagConfig) -> Result<Self> {
        config.validate()?;
        let embedder = providers::build_embedder(config)?;
        let llm = providers::build_generator(config)?;
        Self::open_with(config, embedder, llm).await
    }

    /// Load the persisted index and wire it to the given providers
    pub async fn open_with(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        tracing::info!("Initializing RAG pipeline...");

        let index_dir = config.paths.index_dir.clone();
        let dimensions = embedder.dimensions();
        let index = tokio::task::spawn_blocking(move || VectorIndex::load(index_dir, dimensions))
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;
        tracing::info!("Vector index loaded ({} passages)", index.len());

        let retriever = Retriever::new(embedder, Arc::new(index))?;
        let assembler = PromptAssembler::new(config.prompt.clone());
        let generator =
            AnswerGenerator::new(llm, GenerationSettings::from_config(&config.generation));

        Ok(Self {
            retriever,
            assembler,
            generator,
            top_k: config.retrieval.top_k,
        })
    }

    /// Answer a question with typed errors
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::config("question must not be empty"));
        }

        let retrieval = self.retriever.retrieve(question, self.top_k).await?;
        let prompt = self.assembler.assemble(question, &retrieval)?;
        self.generator.generate(&prompt, retrieval).await
    }

    /// Answer a question; failures become a readable response
    pub async fn ask(&self, question: &str) -> QueryResponse {
        let started = Instant::now();
        if question.trim().is_empty() {
            return QueryResponse::failure("Please enter a question.", 0);
        }

        let result = self.answer(question).await;
        let elapsed = started.elapsed().as_millis() as u64;
        match result {
            Ok(answer) => {
                tracing::info!(
                    "Answered in {}ms with {} citations",
                    elapsed,
                    answer.retrieval.len()
                );
                QueryResponse::success(&answer, elapsed)
            }
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                QueryResponse::failure(e.user_message(), elapsed)
            }
        }
    }
}

/// Initialise-once access to a shared pipeline. Failed initialisation is
/// not cached; the next call tries again.
pub struct PipelineHandle {
    config: RagConfig,
    providers: Option<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)>,
    cell: OnceCell<Arc<RagPipeline>>,
}

impl PipelineHandle {
    /// Handle building providers from config on first use
    pub fn new(config: RagConfig) -> Self {
        Self {
            config,
            providers: None,
            cell: OnceCell::new(),
        }
    }

    /// Handle using the given providers on first use
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            providers: Some((embedder, llm)),
            cell: OnceCell::new(),
        }
    }

    /// The pipeline, initialising it if needed
    pub async fn get(&self) -> Result<Arc<RagPipeline>> {
        self.cell
            .get_or_try_init(|| async {
                let pipeline = match &self.providers {
                    Some((embedder, llm)) => {
                        RagPipeline::open_with(&self.config, embedder.clone(), llm.clone()).await?
                    }
                    None => RagPipeline::open(&self.config).await?,
                };
                Ok::<_, Error>(Arc::new(pipeline))
            })
            .await
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Answer a question, initialising on first use
    pub async fn ask(&self, question: &str) -> QueryResponse {
        match self.get().await {
            Ok(pipeline) => pipeline.ask(question).await,
            Err(e) => {
                tracing::error!("Pipeline unavailable: {}", e);
                QueryResponse::failure(e.user_message(), 0)
            }
        }
    }
}
