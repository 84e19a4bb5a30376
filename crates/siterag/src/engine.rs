//! Engine facade tying retrieval and generation together

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::knowledge::KnowledgeStore;
use crate::provider::{
    EmbeddingProvider, GenerateOptions, GeneratorProvider, KnowledgeSource, RenderOptions,
};
use crate::provision::ProvisioningManager;
use crate::retrieval;
use crate::types::ScoredRecord;

/// The RAG engine: the public surface consumed by the enclosing
/// application.
///
/// Cheap to clone; all state is shared behind an `Arc`. Each engine
/// instance owns its own provisioning lifecycle and knowledge cache, so
/// independent instances stay isolated.
#[derive(Clone)]
pub struct RagEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: RagConfig,
    provisioning: ProvisioningManager,
    knowledge: KnowledgeStore,
}

impl RagEngine {
    /// Create an engine over the given capability providers
    pub fn new(
        config: RagConfig,
        embedding: Arc<dyn EmbeddingProvider>,
        generation: Arc<dyn GeneratorProvider>,
        source: Arc<dyn KnowledgeSource>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                provisioning: ProvisioningManager::new(embedding, generation),
                knowledge: KnowledgeStore::new(source),
            }),
        }
    }

    /// Register the single observer invoked with `(aggregate_percent,
    /// phase_label)` whenever either model load advances
    pub fn set_on_progress_update(&self, listener: impl Fn(f32, &str) + Send + Sync + 'static) {
        self.inner.provisioning.progress().set_listener(listener);
    }

    /// Current aggregate load progress in 0..=100
    pub fn load_progress(&self) -> f32 {
        self.inner.provisioning.progress().aggregate()
    }

    /// Load both models and the knowledge base concurrently.
    ///
    /// Completes only when all three succeed; a single failure fails the
    /// whole call but caches nothing, so a retry re-attempts only what is
    /// still missing.
    pub async fn preload(&self) -> Result<()> {
        tokio::try_join!(
            async {
                self.inner.provisioning.embedder().await?;
                Ok::<_, Error>(())
            },
            async {
                self.inner.provisioning.generator().await?;
                Ok::<_, Error>(())
            },
            async {
                self.inner.knowledge.load().await?;
                Ok::<_, Error>(())
            },
        )?;
        Ok(())
    }

    /// Retrieve the `top_k` records most similar to `query`
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        let records = self.inner.knowledge.load().await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let embedder = self.inner.provisioning.embedder().await?;
        let query_embedding = embedder.embed(query).await?;

        let results = retrieval::rank(&records, &query_embedding, top_k)?;
        tracing::debug!(
            query,
            results = results.len(),
            top_score = results.first().map(|r| r.score),
            "Search complete"
        );

        Ok(results)
    }

    /// Answer `query` grounded in the knowledge base
    pub async fn ask(&self, query: &str) -> Result<String> {
        self.ask_streaming(query, |_| {}).await
    }

    /// Answer `query`, invoking `on_partial` with the full accumulated
    /// answer after every decoded fragment.
    ///
    /// Successive callback values are prefix-extensions of each other,
    /// and the returned value equals the last streamed one. Decoding is
    /// greedy, so identical inputs reproduce identical answers.
    pub async fn ask_streaming(
        &self,
        query: &str,
        mut on_partial: impl FnMut(&str) + Send,
    ) -> Result<String> {
        tracing::info!(query, "Answering query");

        let results = self
            .search(query, self.inner.config.retrieval.context_top_k)
            .await?;
        let context = PromptBuilder::build_context(&results);
        let turns =
            PromptBuilder::build_conversation(&self.inner.config.generation.persona, &context, query);

        let generator = self.inner.provisioning.generator().await?;
        let prompt = generator.render_chat(&turns, &RenderOptions::default())?;

        let options = GenerateOptions {
            max_new_tokens: self.inner.config.generation.max_new_tokens,
            temperature: self.inner.config.generation.temperature,
        };

        let mut answer = String::new();
        {
            let mut sink = |fragment: &str| {
                answer.push_str(fragment);
                on_partial(&answer);
            };
            generator.generate(&prompt, &options, &mut sink).await?;
        }

        tracing::info!(chars = answer.len(), "Answer complete");
        Ok(answer)
    }
}
