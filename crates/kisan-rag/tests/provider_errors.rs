//! Provider HTTP failures against a local stand-in server: rejected requests
//! surface as final provider errors, server errors are retried.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kisan_rag::config::{EmbeddingConfig, GenerationConfig, OllamaConfig};
use kisan_rag::generation::{AnswerGenerator, GenerationSettings};
use kisan_rag::providers::{
    EmbeddingProvider, GeminiGenerator, LlmProvider, OllamaEmbedder, OllamaGenerator, RetryPolicy,
};
use kisan_rag::{Error, RetrievalResult};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Answers every request with the same status line and JSON body
struct StubServer {
    base_url: String,
    requests: Arc<AtomicUsize>,
}

impl StubServer {
    async fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { base_url, requests }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Consume headers and the declared body so the client sees a clean reply
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

fn settings(max_retries: u32) -> GenerationSettings {
    GenerationSettings {
        temperature: 0.3,
        retry: RetryPolicy::new(max_retries, Duration::from_secs(5)).with_base_delay(Duration::ZERO),
    }
}

#[tokio::test]
async fn test_gemini_forbidden_is_final_generation_error() {
    let server = StubServer::start("403 Forbidden", r#"{"error":"API key not valid"}"#).await;
    let config = GenerationConfig {
        gemini_base_url: server.base_url.clone(),
        timeout_secs: 5,
        ..GenerationConfig::default()
    };
    let gemini = Arc::new(GeminiGenerator::with_api_key(&config, "bad-key").unwrap());

    let err = gemini.generate("hi", 0.3).await.unwrap_err();
    match &err {
        Error::Generation { message, retryable } => {
            assert!(message.contains("403"));
            assert!(!retryable);
        }
        other => panic!("expected a generation error, got {:?}", other),
    }
    assert!(!err.is_transient());
    assert_eq!(server.requests(), 1);

    let generator = AnswerGenerator::new(gemini, settings(2));
    let err = generator
        .generate("hi", RetrievalResult::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation { retryable: false, .. }));
    assert_eq!(server.requests(), 2);
}

#[tokio::test]
async fn test_ollama_unknown_model_is_final_embedding_error() {
    let server = StubServer::start("404 Not Found", r#"{"error":"model not found"}"#).await;
    let ollama = OllamaConfig {
        base_url: server.base_url.clone(),
    };
    let embedder = OllamaEmbedder::new(
        &ollama,
        &EmbeddingConfig {
            timeout_secs: 5,
            max_retries: 2,
            ..EmbeddingConfig::default()
        },
    )
    .unwrap();

    let err = embedder.embed("wheat rust").await.unwrap_err();
    assert!(matches!(err, Error::Embedding { retryable: false, .. }));
    assert!(err.to_string().contains("model not found"));
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn test_ollama_server_error_is_retried() {
    let server = StubServer::start("503 Service Unavailable", r#"{"error":"loading"}"#).await;
    let ollama = OllamaConfig {
        base_url: server.base_url.clone(),
    };
    let llm = OllamaGenerator::new(&ollama, "llama3.2", Duration::from_secs(5)).unwrap();
    let generator = AnswerGenerator::new(Arc::new(llm), settings(1));

    let err = generator
        .generate("hi", RetrievalResult::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation { retryable: true, .. }));
    assert_eq!(server.requests(), 2);
}
