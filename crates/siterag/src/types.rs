//! Core data types shared across the engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One precomputed knowledge chunk with its embedding vector.
///
/// Records are immutable once loaded; identity is their position in the
/// loaded sequence. Fields beyond `content` and `embedding` are carried
/// through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// Chunk text handed to the generator as context
    pub content: String,
    /// Precomputed embedding vector
    pub embedding: Vec<f32>,
    /// Opaque metadata preserved from the source document
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A knowledge record ranked against a query
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The retrieved record
    pub record: KnowledgeRecord,
    /// Cosine similarity in [-1, 1], higher is better
    pub score: f32,
}

/// Conversation roles understood by chat templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Role name as it appears in rendered chat templates
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation, built fresh per `ask` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker role
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl ChatTurn {
    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
