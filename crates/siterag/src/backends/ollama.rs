//! Ollama-backed embedding and generation providers
//!
//! Model loading maps Ollama's streamed pull progress onto the engine's
//! progress events. Generation renders a ChatML prompt client-side (the
//! template used by the Qwen2.5-Instruct family) and streams decoded
//! fragments from `/api/generate`.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};
use crate::provider::{
    Embedder, EmbeddingProvider, GenerateOptions, Generator, GeneratorProvider, ProgressEvent,
    ProgressFn, RenderOptions,
};
use crate::types::ChatTurn;

fn build_client(config: &OllamaConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

#[derive(Serialize)]
struct PullRequest<'a> {
    name: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct PullChunk {
    status: String,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}

/// Pull a model, translating the streamed NDJSON status lines into
/// progress events. The terminal `success` line maps to `Done`.
async fn pull_model(
    client: &Client,
    base_url: &str,
    model: &str,
    progress: &ProgressFn,
) -> Result<()> {
    let url = format!("{}/api/pull", base_url);
    tracing::info!(model, "Pulling model");

    let response = client
        .post(&url)
        .json(&PullRequest {
            name: model,
            stream: true,
        })
        .send()
        .await
        .map_err(|e| Error::provisioning(format!("pull request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::provisioning(format!(
            "pull failed: HTTP {}",
            response.status()
        )));
    }

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| Error::provisioning(format!("pull stream error: {}", e)))?;
        buffer.push_str(&String::from_utf8_lossy(&bytes));

        // NDJSON lines may arrive split across chunks
        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer.drain(..=pos);
            if line.is_empty() {
                continue;
            }

            let chunk: PullChunk = match serde_json::from_str(&line) {
                Ok(chunk) => chunk,
                Err(_) => continue,
            };

            if chunk.status == "success" {
                progress(ProgressEvent::Done);
                tracing::info!(model, "Model pull complete");
                return Ok(());
            }

            if let (Some(completed), Some(total)) = (chunk.completed, chunk.total) {
                if total > 0 {
                    let percent = completed as f32 / total as f32 * 100.0;
                    progress(ProgressEvent::InProgress(percent));
                }
            }
        }
    }

    Err(Error::provisioning(format!(
        "pull of '{}' ended before completion",
        model
    )))
}

/// Embedding provider backed by an Ollama server
pub struct OllamaEmbeddingProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaEmbeddingProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Embedder>> {
        pull_model(
            &self.client,
            &self.config.base_url,
            &self.config.embed_model,
            &progress,
        )
        .await?;

        Ok(Arc::new(OllamaEmbedder {
            client: self.client.clone(),
            base_url: self.config.base_url.clone(),
            model: self.config.embed_model.clone(),
        }))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "embedding failed: HTTP {}",
                response.status()
            )));
        }

        let embed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed embedding response: {}", e)))?;

        // Server output is mean-pooled; L2 normalization is applied here
        // so the trait contract holds regardless of server version.
        let mut vector = embed.embedding;
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}

/// Generation provider backed by an Ollama server
pub struct OllamaGeneratorProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaGeneratorProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl GeneratorProvider for OllamaGeneratorProvider {
    async fn load(&self, progress: ProgressFn) -> Result<Arc<dyn Generator>> {
        pull_model(
            &self.client,
            &self.config.base_url,
            &self.config.generate_model,
            &progress,
        )
        .await?;

        Ok(Arc::new(OllamaGenerator {
            client: self.client.clone(),
            base_url: self.config.base_url.clone(),
            model: self.config.generate_model.clone(),
        }))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: GenerateRequestOptions,
}

#[derive(Serialize)]
struct GenerateRequestOptions {
    temperature: f32,
    num_predict: i64,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// ChatML: `<|im_start|>{role}\n{content}<|im_end|>`
    fn render_chatml(turns: &[ChatTurn], add_generation_prompt: bool) -> String {
        let mut prompt = String::new();
        for turn in turns {
            prompt.push_str("<|im_start|>");
            prompt.push_str(turn.role.as_str());
            prompt.push('\n');
            prompt.push_str(&turn.content);
            prompt.push_str("<|im_end|>\n");
        }
        if add_generation_prompt {
            prompt.push_str("<|im_start|>assistant\n");
        }
        prompt
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn render_chat(&self, turns: &[ChatTurn], opts: &RenderOptions) -> Result<String> {
        Ok(Self::render_chatml(turns, opts.add_generation_prompt))
    }

    async fn generate(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<()> {
        let url = format!("{}/api/generate", self.base_url);

        // raw mode: the prompt is already templated and the server must
        // stream only newly generated text
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: true,
            options: GenerateRequestOptions {
                temperature: opts.temperature,
                num_predict: opts.max_new_tokens as i64,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| Error::generation(format!("decode stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);
                if line.is_empty() {
                    continue;
                }

                let chunk: GenerateChunk = serde_json::from_str(&line)
                    .map_err(|e| Error::generation(format!("malformed stream chunk: {}", e)))?;

                if !chunk.response.is_empty() {
                    sink(chunk.response.as_str());
                }
                if chunk.done {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatTurn;

    #[test]
    fn chatml_render_wraps_turns_and_opens_assistant() {
        let turns = vec![ChatTurn::system("be brief"), ChatTurn::user("hi")];
        let prompt = OllamaGenerator::render_chatml(&turns, true);

        assert_eq!(
            prompt,
            "<|im_start|>system\nbe brief<|im_end|>\n\
             <|im_start|>user\nhi<|im_end|>\n\
             <|im_start|>assistant\n"
        );
    }

    #[test]
    fn chatml_render_can_omit_generation_prompt() {
        let turns = vec![ChatTurn::user("hi")];
        let prompt = OllamaGenerator::render_chatml(&turns, false);
        assert!(!prompt.ends_with("<|im_start|>assistant\n"));
        assert!(prompt.ends_with("<|im_end|>\n"));
    }
}
