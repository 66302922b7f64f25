//! End-to-end ingestion and question answering with an offline embedder
//! and a deterministic stand-in for the generative model.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kisan_rag::config::EmbeddingBackend;
use kisan_rag::providers::{HashingEmbedder, LlmProvider};
use kisan_rag::{Error, IngestPipeline, PipelineHandle, RagConfig, RagPipeline, Result, VectorIndex};

const STOPWORDS: &[&str] = &["what", "when", "which", "does", "with", "from", "this", "that", "have"];

/// Answers from the first context passage when the question's keywords occur
/// in the context, otherwise with the fallback phrase the prompt asks for.
struct GroundedStub {
    calls: AtomicUsize,
}

impl GroundedStub {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &text[from..];
    &rest[..rest.find(end).unwrap_or(rest.len())]
}

#[async_trait]
impl LlmProvider for GroundedStub {
    async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let fallback = between(prompt, "say \"", "\"");
        let context = between(prompt, "Context:\n", "\nQuestion: ");
        let question = between(prompt, "\nQuestion: ", "\n");

        let context_words = words(context);
        let grounded = words(question)
            .iter()
            .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(&w.as_str()))
            .any(|w| context_words.contains(w));

        if !grounded {
            return Ok(fallback.to_string());
        }

        let mut lines = context.lines();
        let source = lines
            .next()
            .and_then(|l| l.split("Source: ").nth(1))
            .unwrap_or("unknown");
        let text = lines.next().unwrap_or_default();
        Ok(format!("{} [Source: {}]", text, source))
    }

    fn name(&self) -> &str {
        "grounded-stub"
    }

    fn model(&self) -> &str {
        "stub"
    }
}

fn config(root: &Path, dimensions: usize) -> RagConfig {
    let mut config = RagConfig::default();
    config.paths.corpus_dir = root.join("data");
    config.paths.index_dir = root.join("vectorstore").join("db_index");
    config.embeddings.provider = EmbeddingBackend::Hashing;
    config.embeddings.dimensions = dimensions;
    config
}

fn write_corpus(root: &Path, files: &[(&str, &str)]) {
    let dir = root.join("data");
    std::fs::create_dir_all(&dir).unwrap();
    for (name, text) in files {
        std::fs::write(dir.join(name), text).unwrap();
    }
}

fn embedder(config: &RagConfig) -> Arc<HashingEmbedder> {
    Arc::new(HashingEmbedder::from_config(&config.embeddings).unwrap())
}

async fn ingest(config: &RagConfig) {
    IngestPipeline::new(config, embedder(config))
        .unwrap()
        .run()
        .await
        .unwrap();
}

async fn open(config: &RagConfig, llm: Arc<GroundedStub>) -> RagPipeline {
    RagPipeline::open_with(config, embedder(config), llm).await.unwrap()
}

#[tokio::test]
async fn test_answer_cites_matching_handbook() {
    let root = tempfile::tempdir().unwrap();
    write_corpus(
        root.path(),
        &[
            ("wheat_guide.txt", "Wheat rust is treated with fungicide X."),
            ("rice.txt", "Paddy transplanting is done in July with 20 cm spacing."),
            ("mustard.txt", "Mustard aphids are controlled with neem oil spray."),
        ],
    );
    let config = config(root.path(), 768);
    ingest(&config).await;

    let pipeline = open(&config, GroundedStub::new()).await;
    let answer = pipeline.answer("How do I treat wheat rust?").await.unwrap();

    let top = answer.retrieval.top().unwrap();
    assert_eq!(top.passage.text, "Wheat rust is treated with fungicide X.");
    assert!(answer.text.contains("fungicide X"));
    assert!(answer.text.contains("wheat_guide.txt"));

    let response = pipeline.ask("How do I treat wheat rust?").await;
    assert!(response.is_success());
    assert_eq!(response.citations.len(), 3);
    assert_eq!(response.citations[0].source_name, "wheat_guide.txt");
    assert_eq!(response.citations[0].page, None);
}

#[tokio::test]
async fn test_out_of_corpus_question_gets_fallback() {
    let root = tempfile::tempdir().unwrap();
    write_corpus(
        root.path(),
        &[(
            "irrigation.md",
            "Drip irrigation saves water in sugarcane fields.\n\nFlood irrigation wastes water.",
        )],
    );
    let config = config(root.path(), 256);
    ingest(&config).await;

    let pipeline = open(&config, GroundedStub::new()).await;
    let response = pipeline
        .ask("What is the interest rate on a tractor loan?")
        .await;

    assert!(response.is_success());
    assert_eq!(response.answer, "I do not have official information on this.");
}

#[tokio::test]
async fn test_empty_corpus_writes_no_index() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("data")).unwrap();
    let config = config(root.path(), 64);

    let err = IngestPipeline::new(&config, embedder(&config))
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyCorpus(_)));
    assert!(!config.paths.index_dir.exists());
}

#[tokio::test]
async fn test_dimension_mismatch_detected_at_load() {
    let root = tempfile::tempdir().unwrap();
    write_corpus(root.path(), &[("wheat.txt", "Sow wheat in November.")]);
    let config_768 = config(root.path(), 768);
    ingest(&config_768).await;

    assert!(matches!(
        VectorIndex::load(&config_768.paths.index_dir, 384),
        Err(Error::DimensionMismatch { expected: 384, actual: 768 })
    ));

    let config_384 = config(root.path(), 384);
    let err = RagPipeline::open_with(&config_384, embedder(&config_384), GroundedStub::new())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert!(err.user_message().contains("kisan-rag ingest"));
}

#[tokio::test]
async fn test_handle_retries_after_failed_initialisation() {
    let root = tempfile::tempdir().unwrap();
    let config = config(root.path(), 128);
    let llm = GroundedStub::new();
    let handle = PipelineHandle::with_providers(config.clone(), embedder(&config), llm.clone());

    let response = handle.ask("How do I treat wheat rust?").await;
    assert!(!response.is_success());
    assert!(response.error.unwrap().contains("kisan-rag ingest"));
    assert!(!handle.is_initialized());

    write_corpus(root.path(), &[("wheat.txt", "Wheat rust is treated with fungicide X.")]);
    ingest(&config).await;

    let (a, b) = tokio::join!(handle.get(), handle.get());
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));

    let response = handle.ask("How do I treat wheat rust?").await;
    assert!(response.is_success());
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failures_become_responses() {
    let root = tempfile::tempdir().unwrap();
    write_corpus(root.path(), &[("wheat.txt", "Wheat rust is treated with fungicide X.")]);
    let mut config = config(root.path(), 128);
    ingest(&config).await;

    let pipeline = open(&config, GroundedStub::new()).await;
    let blank = pipeline.ask("   ").await;
    assert!(!blank.is_success());
    assert!(blank.citations.is_empty());

    config.prompt.max_prompt_chars = 100;
    let pipeline = open(&config, GroundedStub::new()).await;
    assert!(matches!(
        pipeline.answer("How do I treat wheat rust?").await,
        Err(Error::ContextTooLarge { limit: 100, .. })
    ));
    let response = pipeline.ask("How do I treat wheat rust?").await;
    assert!(!response.is_success());
    assert!(response.error.unwrap().contains("top_k"));
}
