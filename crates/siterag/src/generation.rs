//! Prompt assembly for grounded generation

use crate::types::{ChatTurn, ScoredRecord};

/// Prompt builder for grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved chunk texts in rank order, separated by a
    /// blank line
    pub fn build_context(results: &[ScoredRecord]) -> String {
        results
            .iter()
            .map(|r| r.record.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the two-turn conversation: a system turn carrying the
    /// persona, the grounding rules, and the context, then the raw user
    /// query.
    pub fn build_conversation(persona: &str, context: &str, query: &str) -> Vec<ChatTurn> {
        let system = format!(
            "{persona} Use ONLY the provided context to answer. \
             If the answer is not in the context, politely say you don't know \
             and offer to talk about topics the context does cover. \
             Context:\n{context}"
        );

        vec![ChatTurn::system(system), ChatTurn::user(query)]
    }
}
