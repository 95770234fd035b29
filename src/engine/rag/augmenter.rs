// ── Fieldmind: Context Augmenter ───────────────────────────────────────────
//
// Turns retrieved items into a labeled context block. Each strategy picks a
// different slice of the retrieval and tags it (Fact: / Inspiration: /
// Connection: / Intuition:); the labels are load-bearing downstream, the
// response builder keys its phrasing off them. The existing context always
// leads, parts join with " | ".

use crate::atoms::types::{RetrievalSource, RetrievedItem, Strategy};

pub struct ContextAugmenter;

impl ContextAugmenter {
    /// Build the augmented context for a strategy.
    pub fn augment(strategy: Strategy, current_context: &str, retrieved: &[RetrievedItem]) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !current_context.is_empty() {
            parts.push(current_context.to_string());
        }

        match strategy {
            Strategy::Factual => {
                for item in retrieved.iter().take(3) {
                    if item.relevance > 0.5 && item.source == RetrievalSource::Deterministic {
                        parts.push(format!("Fact: {}", item.content));
                    }
                }
            }
            Strategy::Creative => {
                for item in retrieved.iter().step_by(2) {
                    parts.push(format!("Inspiration: {}", item.content));
                }
            }
            Strategy::Chaotic => {
                for item in retrieved {
                    if item.source == RetrievalSource::Chaotic {
                        parts.push(format!("Intuition: {}", item.content));
                    }
                }
            }
            Strategy::Balanced => {
                for item in retrieved.iter().filter(|i| i.relevance > 0.6).take(2) {
                    parts.push(format!("Fact: {}", item.content));
                }
                for item in retrieved
                    .iter()
                    .filter(|i| i.relevance > 0.3 && i.relevance <= 0.6)
                    .take(1)
                {
                    parts.push(format!("Connection: {}", item.content));
                }
                for item in retrieved
                    .iter()
                    .filter(|i| i.source == RetrievalSource::Chaotic)
                    .take(1)
                {
                    parts.push(format!("Intuition: {}", item.content));
                }
            }
        }

        parts.join(" | ")
    }
}
