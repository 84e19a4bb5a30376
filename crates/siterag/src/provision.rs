//! Lazy model provisioning with de-duplicated loads
//!
//! Each model lives in its own cache slot. The first caller triggers the
//! load; concurrent callers await the same in-flight attempt. A failed
//! load leaves the slot empty so a later call can retry.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::progress::{ModelPhase, ProgressTracker};
use crate::provider::{
    Embedder, EmbeddingProvider, Generator, GeneratorProvider, ProgressFn,
};

/// Owns the embedder and generator handles and their load lifecycles
pub struct ProvisioningManager {
    embedding: Arc<dyn EmbeddingProvider>,
    generation: Arc<dyn GeneratorProvider>,
    progress: Arc<ProgressTracker>,
    embedder: OnceCell<Arc<dyn Embedder>>,
    generator: OnceCell<Arc<dyn Generator>>,
}

impl ProvisioningManager {
    pub fn new(
        embedding: Arc<dyn EmbeddingProvider>,
        generation: Arc<dyn GeneratorProvider>,
    ) -> Self {
        Self {
            embedding,
            generation,
            progress: Arc::new(ProgressTracker::new()),
            embedder: OnceCell::new(),
            generator: OnceCell::new(),
        }
    }

    /// Progress tracker shared with both model loads
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// Get the embedder handle, loading the model on first call
    pub async fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let handle = self
            .embedder
            .get_or_try_init(|| async {
                tracing::info!("Loading embedding model");
                let progress = Arc::clone(&self.progress);
                let callback: ProgressFn =
                    Arc::new(move |event| progress.update(ModelPhase::Embedder, event));
                let handle = self.embedding.load(callback).await?;
                tracing::info!("Embedding model ready");
                Ok::<_, crate::error::Error>(handle)
            })
            .await?;

        Ok(Arc::clone(handle))
    }

    /// Get the generator handle, loading the model on first call
    pub async fn generator(&self) -> Result<Arc<dyn Generator>> {
        let handle = self
            .generator
            .get_or_try_init(|| async {
                tracing::info!("Loading generation model");
                let progress = Arc::clone(&self.progress);
                let callback: ProgressFn =
                    Arc::new(move |event| progress.update(ModelPhase::Generator, event));
                let handle = self.generation.load(callback).await?;
                tracing::info!("Generation model ready");
                Ok::<_, crate::error::Error>(handle)
            })
            .await?;

        Ok(Arc::clone(handle))
    }
}
