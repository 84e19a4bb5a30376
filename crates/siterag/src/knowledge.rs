//! In-memory cache over the static knowledge base

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::provider::KnowledgeSource;
use crate::types::KnowledgeRecord;

/// Owns the ordered record sequence, fetched once and cached for the
/// process lifetime.
///
/// Concurrent callers during the first load share the in-flight fetch.
/// A failed fetch is not cached; the next call retries.
pub struct KnowledgeStore {
    source: Arc<dyn KnowledgeSource>,
    records: OnceCell<Arc<Vec<KnowledgeRecord>>>,
}

impl KnowledgeStore {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self {
            source,
            records: OnceCell::new(),
        }
    }

    /// Load the knowledge base, fetching from the source on first call
    pub async fn load(&self) -> Result<Arc<Vec<KnowledgeRecord>>> {
        let records = self
            .records
            .get_or_try_init(|| async {
                tracing::info!("Loading knowledge base");
                let records = self.source.fetch().await?;
                tracing::info!(records = records.len(), "Knowledge base loaded");
                Ok::<_, Error>(Arc::new(records))
            })
            .await?;

        Ok(Arc::clone(records))
    }
}
