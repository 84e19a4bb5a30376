//! Similarity-ranked retrieval over the knowledge base

use crate::error::{Error, Result};
use crate::types::{KnowledgeRecord, ScoredRecord};

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Mismatched dimensions and zero-norm inputs are data-integrity errors;
/// a NaN score must never reach the ranking stage.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(Error::retrieval(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(Error::retrieval("zero-norm vector"));
    }

    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Rank every record against the query embedding and keep the top `top_k`.
///
/// Results are sorted by score descending; ties keep original store
/// order (stable sort), so ranking is deterministic. A `top_k` larger
/// than the store returns every record.
///
/// A stored record whose embedding dimensionality disagrees with the
/// query is a data-integrity error. A zero-norm stored embedding is
/// excluded from the ranking rather than scored as NaN.
pub fn rank(
    records: &[KnowledgeRecord],
    query: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredRecord>> {
    let query_norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    if query_norm == 0.0 {
        return Err(Error::retrieval("query embedding has zero norm"));
    }

    let mut scored = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.embedding.len() != query.len() {
            return Err(Error::retrieval(format!(
                "record {} has {} dimensions, query has {}",
                index,
                record.embedding.len(),
                query.len()
            )));
        }

        let mut dot = 0.0f32;
        let mut norm = 0.0f32;
        for (x, y) in query.iter().zip(record.embedding.iter()) {
            dot += x * y;
            norm += y * y;
        }
        let norm = norm.sqrt();

        if norm == 0.0 {
            tracing::warn!(record = index, "excluding zero-norm embedding from ranking");
            continue;
        }

        scored.push(ScoredRecord {
            record: record.clone(),
            score: dot / (query_norm * norm),
        });
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);

    Ok(scored)
}
