//! Error types for the RAG engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model provisioning error (embedder or generator failed to load)
    #[error("Model provisioning failed: {0}")]
    Provisioning(String),

    /// Knowledge base load error
    #[error("Knowledge base load failed: {0}")]
    Knowledge(String),

    /// Retrieval error (malformed or inconsistent embeddings)
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Generation/decoding error
    #[error("Generation failed: {0}")]
    Generation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a provisioning error
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning(message.into())
    }

    /// Create a knowledge base error
    pub fn knowledge(message: impl Into<String>) -> Self {
        Self::Knowledge(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}
