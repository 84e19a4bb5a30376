//! Capability provider traits
//!
//! The engine does no inference math itself. Embedding, generation, and
//! the static knowledge base are external collaborators plugged in
//! through the object-safe traits below.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{ChatTurn, KnowledgeRecord};

/// A load-progress event reported by a provider.
///
/// A terminal `Done` is authoritative and maps to 100% regardless of the
/// last numeric value reported; providers may skip straight to `Done`
/// without any intermediate events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Load underway, percent in 0..=100
    InProgress(f32),
    /// Load finished
    Done,
}

/// Callback handed to providers for load-progress reporting
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Factory for the embedding capability
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Load the embedding model, reporting progress through `progress`.
    /// Called at most once per successful provisioning cycle; a failed
    /// load may be retried with a fresh call.
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Embedder>>;
}

/// A loaded embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a text into a mean-pooled, L2-normalized vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Factory for the text-generation capability
#[async_trait]
pub trait GeneratorProvider: Send + Sync {
    /// Load the generation model, reporting progress through `progress`
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Generator>>;
}

/// Chat-template rendering options
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Append the template's generation-start marker so the model begins
    /// an assistant turn
    pub add_generation_prompt: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            add_generation_prompt: true,
        }
    }
}

/// Decoding options for one generation call
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    /// Maximum number of new tokens to decode
    pub max_new_tokens: usize,
    /// Sampling temperature; 0.0 selects greedy decoding
    pub temperature: f32,
}

/// A loaded generation model
#[async_trait]
pub trait Generator: Send + Sync {
    /// Render a structured conversation into the literal prompt string
    /// this model expects. Rendering stays in string space (no
    /// pre-tokenization).
    fn render_chat(&self, turns: &[ChatTurn], opts: &RenderOptions) -> Result<String>;

    /// Decode a completion for `prompt`, invoking `sink` once per decoded
    /// text fragment. Fragments contain generated text only; the prompt
    /// is never echoed into the sink.
    async fn generate(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<()>;
}

/// Source of the precomputed knowledge base
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Fetch and parse the full ordered record sequence
    async fn fetch(&self) -> Result<Vec<KnowledgeRecord>>;
}
