//! Configuration for the RAG engine

use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Knowledge base configuration
    pub knowledge: KnowledgeConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation configuration
    pub generation: GenerationConfig,
}

/// Knowledge base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Location of the precomputed knowledge base: an HTTP(S) URL or a
    /// local file path, pointing at a JSON array of records with at least
    /// `content` and `embedding` fields.
    pub source: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source: "data/embeddings.json".to_string(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of records handed to the generator as grounding context
    pub context_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { context_top_k: 3 }
    }
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Persona/identity line placed at the top of the system turn
    pub persona: String,
    /// Maximum number of new tokens per answer
    pub max_new_tokens: usize,
    /// Sampling temperature; 0.0 selects greedy decoding
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            persona: "You are the site's AI assistant.".to_string(),
            max_new_tokens: 256,
            temperature: 0.0, // greedy decoding for reproducible answers
        }
    }
}

/// Ollama backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "all-minilm".to_string(),
            generate_model: "qwen2.5:0.5b-instruct".to_string(),
            timeout_secs: 300,
        }
    }
}
