//! # siterag
//!
//! An embeddable retrieval-augmented-generation (RAG) engine: given a
//! user question it retrieves the most relevant precomputed knowledge
//! chunks by cosine similarity, grounds a chat prompt in them, and
//! streams the generated answer back incrementally.
//!
//! ## How it works
//! ```text
//! "What projects have you built?"
//!   ↓
//! RagEngine::ask_streaming(query, on_partial)
//!   ↓ embed query, rank knowledge records
//! Top 3 chunks, joined as grounding context
//!   ↓ system + user turns → chat template
//! Generator streams greedy-decoded fragments
//!   ↓
//! on_partial receives the growing answer; final string returned
//! ```
//!
//! The embedder, generator, and knowledge base are external capabilities
//! plugged in through the traits in [`provider`]; [`backends`] ships
//! Ollama-backed providers and a static JSON knowledge source. Both
//! models are provisioned lazily with de-duplicated loads and a single
//! aggregated progress signal.

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod knowledge;
pub mod progress;
pub mod provider;
pub mod provision;
pub mod retrieval;
pub mod types;

pub use config::{GenerationConfig, KnowledgeConfig, OllamaConfig, RagConfig, RetrievalConfig};
pub use engine::RagEngine;
pub use error::{Error, Result};
pub use types::{ChatTurn, KnowledgeRecord, Role, ScoredRecord};
