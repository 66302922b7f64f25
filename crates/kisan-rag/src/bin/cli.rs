//! Kisan Sahayak command line
//!
//! Run with: cargo run -p kisan-rag -- ask "How do I treat wheat rust?"

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kisan_rag::{
    providers, IngestPipeline, PipelineHandle, QueryResponse, RagConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kisan-rag", version)]
#[command(about = "Rural advisory answers grounded in agricultural handbooks")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index from the handbook corpus
    Ingest {
        /// Directory of handbook documents
        #[arg(long)]
        corpus: Option<PathBuf>,
        /// Directory to write the index into
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Answer a single question
    Ask {
        /// The farmer's question, in Hindi or English
        question: String,
    },
    /// Answer questions read line by line from stdin
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "kisan_rag=debug"
    } else {
        "kisan_rag=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => RagConfig::from_file(path)?,
        None => RagConfig::default(),
    };

    match cli.command {
        Commands::Ingest { corpus, index } => {
            if let Some(corpus) = corpus {
                config.paths.corpus_dir = corpus;
            }
            if let Some(index) = index {
                config.paths.index_dir = index;
            }
            config.validate()?;
            log_config(&config);

            let embedder = providers::build_embedder(&config)?;
            let report = IngestPipeline::new(&config, embedder)?
                .run()
                .await
                .with_context(|| {
                    format!("ingestion of {} failed", config.paths.corpus_dir.display())
                })?;

            println!(
                "Indexed {} documents as {} passages ({} dims, {}) into {} in {:.1}s",
                report.documents,
                report.passages,
                report.dimensions,
                report.model_id,
                report.index_dir.display(),
                report.elapsed.as_secs_f64()
            );
        }
        Commands::Ask { question } => {
            config.validate()?;
            log_config(&config);

            let handle = PipelineHandle::new(config);
            let response = handle.ask(&question).await;
            print_response(&response);
            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Chat => {
            config.validate()?;
            log_config(&config);

            println!("Kisan Sahayak: ask about crop diseases, schemes, or weather (Ctrl+D to exit)");
            let handle = PipelineHandle::new(config);
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            loop {
                print!("> ");
                std::io::stdout().flush()?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                print_response(&handle.ask(&line).await);
            }
        }
    }

    Ok(())
}

fn log_config(config: &RagConfig) {
    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus: {}", config.paths.corpus_dir.display());
    tracing::info!("  - Index: {}", config.paths.index_dir.display());
    tracing::info!(
        "  - Embedding model: {} ({} dims)",
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM model: {}", config.generation.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
}

fn print_response(response: &QueryResponse) {
    if let Some(error) = &response.error {
        eprintln!("Error: {}", error);
        return;
    }

    println!("\n{}\n", response.answer);
    if !response.citations.is_empty() {
        println!("Sources cited:");
        for citation in &response.citations {
            println!("  {}", citation.format_caption());
        }
    }
    println!();
}
