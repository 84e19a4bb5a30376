//! Static JSON knowledge-base source
//!
//! Reads the precomputed record array either from an HTTP(S) URL or a
//! local file, depending on the configured location.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::KnowledgeConfig;
use crate::error::{Error, Result};
use crate::provider::KnowledgeSource;
use crate::types::KnowledgeRecord;

/// Knowledge source backed by a static JSON document
pub struct JsonKnowledgeSource {
    location: String,
    client: Client,
}

impl JsonKnowledgeSource {
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self {
            location: config.source.clone(),
            client: Client::new(),
        }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

#[async_trait]
impl KnowledgeSource for JsonKnowledgeSource {
    async fn fetch(&self) -> Result<Vec<KnowledgeRecord>> {
        tracing::info!(location = %self.location, "Fetching knowledge base");

        if self.is_remote() {
            let response = self
                .client
                .get(&self.location)
                .send()
                .await
                .map_err(|e| Error::knowledge(format!("fetch failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::knowledge(format!(
                    "fetch failed: HTTP {}",
                    response.status()
                )));
            }

            response
                .json()
                .await
                .map_err(|e| Error::knowledge(format!("malformed knowledge base: {}", e)))
        } else {
            let bytes = tokio::fs::read(&self.location)
                .await
                .map_err(|e| Error::knowledge(format!("read '{}' failed: {}", self.location, e)))?;

            serde_json::from_slice(&bytes)
                .map_err(|e| Error::knowledge(format!("malformed knowledge base: {}", e)))
        }
    }
}
