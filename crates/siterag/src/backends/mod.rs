//! Shipped capability backends

mod ollama;
mod source;

pub use ollama::{OllamaEmbeddingProvider, OllamaGeneratorProvider};
pub use source::JsonKnowledgeSource;
