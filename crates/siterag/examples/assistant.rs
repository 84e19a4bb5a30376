//! Terminal assistant over a local Ollama server.
//!
//! Usage: `cargo run --example assistant -- "What projects are listed?"`
//! Expects a knowledge base at `data/embeddings.json` (override with the
//! SITERAG_KNOWLEDGE env var).

use std::io::Write;
use std::sync::Arc;

use siterag::backends::{JsonKnowledgeSource, OllamaEmbeddingProvider, OllamaGeneratorProvider};
use siterag::{KnowledgeConfig, OllamaConfig, RagConfig, RagEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siterag=info".into()),
        )
        .init();

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is this site about?".to_string());

    let mut config = RagConfig::default();
    if let Ok(location) = std::env::var("SITERAG_KNOWLEDGE") {
        config.knowledge = KnowledgeConfig { source: location };
    }

    let ollama = OllamaConfig::default();
    let engine = RagEngine::new(
        config.clone(),
        Arc::new(OllamaEmbeddingProvider::new(&ollama)?),
        Arc::new(OllamaGeneratorProvider::new(&ollama)?),
        Arc::new(JsonKnowledgeSource::new(&config.knowledge)),
    );

    engine.set_on_progress_update(|percent, phase| {
        print!("\rloading {phase}: {percent:5.1}%");
        let _ = std::io::stdout().flush();
    });

    engine.preload().await?;
    println!("\rmodels ready            ");

    println!("\n> {question}\n");

    let mut printed = 0usize;
    let answer = engine
        .ask_streaming(&question, |partial| {
            // partial is cumulative; print only the new tail
            print!("{}", &partial[printed..]);
            printed = partial.len();
            let _ = std::io::stdout().flush();
        })
        .await?;

    if answer.is_empty() {
        println!("(no answer)");
    }
    println!();

    Ok(())
}
