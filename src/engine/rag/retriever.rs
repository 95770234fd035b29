// ── Fieldmind: Chaotic Retriever ───────────────────────────────────────────
//
// Two-channel retrieval over the conversation log. The deterministic channel
// is a plain substring search; the chaotic channel samples uniformly random
// rows and boosts them by a hash-derived pseudo-random factor, injecting
// serendipity without any RNG state. The channels are fused by id: a row
// found by both keeps its first relevance plus half of the second.

use crate::atoms::constants::{CHAOS_SAMPLE_SCALE, RETRIEVE_DETERMINISTIC_CAP};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{ConversationTurn, RetrievalSource, RetrievedItem};
use crate::engine::memory::store::MemoryStore;
use crate::engine::rag::chaos_hash;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ChaoticRetriever {
    store: Arc<MemoryStore>,
}

impl ChaoticRetriever {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `limit` scored items for a query. `chaos_level`
    /// controls the random channel: the sample size is `20 * chaos_level`
    /// rows, so 0.0 disables it entirely.
    pub fn retrieve_context(
        &self,
        query: &str,
        chaos_level: f64,
        limit: usize,
    ) -> EngineResult<Vec<RetrievedItem>> {
        if limit == 0 {
            return Err(EngineError::Config("retrieval limit must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&chaos_level) {
            return Err(EngineError::Config(format!(
                "chaos_level must be within [0, 1], got {}",
                chaos_level
            )));
        }

        let mut fused: HashMap<String, RetrievedItem> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for item in self.deterministic_search(query)? {
            order.push(item.id.clone());
            fused.insert(item.id.clone(), item);
        }
        for item in self.chaotic_search(query, chaos_level)? {
            match fused.get_mut(&item.id) {
                // Found by both channels: half credit for the second hit.
                Some(existing) => existing.relevance += item.relevance * 0.5,
                None => {
                    order.push(item.id.clone());
                    fused.insert(item.id.clone(), item);
                }
            }
        }

        let mut results: Vec<RetrievedItem> =
            order.into_iter().filter_map(|id| fused.remove(&id)).collect();
        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(limit);
        debug!(
            "[rag] Retrieved {} items for query (chaos {:.2})",
            results.len(),
            chaos_level
        );
        Ok(results)
    }

    fn deterministic_search(&self, query: &str) -> EngineResult<Vec<RetrievedItem>> {
        let rows = self
            .store
            .search_conversations(query, RETRIEVE_DETERMINISTIC_CAP)?;
        Ok(rows
            .into_iter()
            .map(|(rowid, turn)| {
                let relevance = calculate_relevance(query, &exchange_text(&turn));
                make_item(rowid, &turn, RetrievalSource::Deterministic, relevance)
            })
            .collect())
    }

    fn chaotic_search(&self, query: &str, chaos_level: f64) -> EngineResult<Vec<RetrievedItem>> {
        let sample_size = (CHAOS_SAMPLE_SCALE * chaos_level) as usize;
        if sample_size == 0 {
            return Ok(Vec::new());
        }
        let rows = self.store.sample_conversations(sample_size)?;
        Ok(rows
            .into_iter()
            .map(|(rowid, turn)| {
                let base = calculate_relevance(query, &exchange_text(&turn));
                let boost = chaos_level * (0.5 + 0.5 * chaos_hash(&turn.user_input));
                make_item(rowid, &turn, RetrievalSource::Chaotic, base + boost)
            })
            .collect())
    }
}

fn exchange_text(turn: &ConversationTurn) -> String {
    format!("{} {}", turn.user_input, turn.agent_output)
}

fn make_item(
    rowid: i64,
    turn: &ConversationTurn,
    source: RetrievalSource,
    relevance: f64,
) -> RetrievedItem {
    RetrievedItem {
        id: format!("conv_{}", rowid),
        content: format!("User: {} | Agent: {}", turn.user_input, turn.agent_output),
        source,
        relevance,
        timestamp: turn.timestamp,
    }
}

/// Relevance of `content` to `query`: 70% token-set Jaccard, 30% the fraction
/// of query tokens appearing anywhere in the content.
pub fn calculate_relevance(query: &str, content: &str) -> f64 {
    let query_words: std::collections::HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();
    let content_lower = content.to_lowercase();
    let content_words: std::collections::HashSet<String> = content_lower
        .split_whitespace()
        .map(String::from)
        .collect();
    if query_words.is_empty() || content_words.is_empty() {
        return 0.0;
    }

    let intersection = query_words.intersection(&content_words).count() as f64;
    let union = query_words.union(&content_words).count() as f64;
    let jaccard = intersection / union;

    let exact_matches = query_words
        .iter()
        .filter(|w| content_lower.contains(w.as_str()))
        .count() as f64;
    let exact_bonus = exact_matches / query_words.len() as f64;

    jaccard * 0.7 + exact_bonus * 0.3
}
