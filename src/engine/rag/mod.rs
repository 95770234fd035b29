// ── Fieldmind: RAG Orchestrator ────────────────────────────────────────────
//
// Retrieval-augmented response shaping without a language model: retrieval
// fuses deterministic and random channels, the augmenter labels the result,
// and a handful of textual rules rephrase the base response around those
// labels. Feedback nudges the chaos factor up or down over time.

pub mod augmenter;
pub mod retriever;

pub use augmenter::ContextAugmenter;
pub use retriever::ChaoticRetriever;

use crate::atoms::constants::{
    CHAOS_FACTOR_MAX, CHAOS_FACTOR_MIN, CHAOS_NUDGE_DOWN, CHAOS_NUDGE_UP, FEEDBACK_BAD,
    FEEDBACK_GOOD, RAG_HISTORY_CAP,
};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{RagConfig, RagStats, Strategy};
use crate::engine::memory::store::MemoryStore;
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Deterministic stand-in for randomness: the first 8 bytes of SHA-256 of the
/// text, mapped to [0, 1). The same input always lands on the same value, so
/// "chaotic" behavior stays reproducible in tests and replays.
pub fn chaos_hash(text: &str) -> f64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) as f64 / (u64::MAX as f64 + 1.0)
}

/// One recorded RAG turn.
#[derive(Debug, Clone, Serialize)]
pub struct RagTurn {
    pub user_input: String,
    pub base_response: String,
    pub improved_response: String,
    pub context: String,
    pub strategy: Strategy,
    pub timestamp: f64,
}

pub struct FieldRag {
    retriever: ChaoticRetriever,
    chaos_factor: f64,
    history: VecDeque<RagTurn>,
    total_queries: usize,
    feedback: HashMap<Strategy, Vec<f64>>,
}

impl FieldRag {
    pub fn new(store: Arc<MemoryStore>, config: RagConfig) -> Self {
        Self {
            retriever: ChaoticRetriever::new(store),
            chaos_factor: config.chaos_factor.clamp(CHAOS_FACTOR_MIN, CHAOS_FACTOR_MAX),
            history: VecDeque::with_capacity(RAG_HISTORY_CAP),
            total_queries: 0,
            feedback: HashMap::new(),
        }
    }

    pub fn chaos_factor(&self) -> f64 {
        self.chaos_factor
    }

    pub fn retriever(&self) -> &ChaoticRetriever {
        &self.retriever
    }

    /// Retrieve with the adaptive chaos factor as the chaos level.
    pub fn retrieve(
        &self,
        query: &str,
        limit: usize,
    ) -> EngineResult<Vec<crate::atoms::types::RetrievedItem>> {
        self.retriever.retrieve_context(query, self.chaos_factor, limit)
    }

    /// Rephrase `base_response` in light of retrieved context. Returns the
    /// improved response and the augmented context it was built from.
    pub fn generate_augmented_response(
        &mut self,
        user_input: &str,
        base_response: &str,
        strategy: Strategy,
    ) -> EngineResult<(String, String)> {
        let retrieved = self.retrieve(user_input, 8)?;
        let context = ContextAugmenter::augment(strategy, "", &retrieved);
        let improved = improve_response(user_input, base_response, &context);

        if self.history.len() == RAG_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(RagTurn {
            user_input: user_input.to_string(),
            base_response: base_response.to_string(),
            improved_response: improved.clone(),
            context: context.clone(),
            strategy,
            timestamp: chrono::Utc::now().timestamp() as f64,
        });
        self.total_queries += 1;

        Ok((improved, context))
    }

    /// Record feedback for a strategy and adapt the chaos factor. Only
    /// chaotic-strategy feedback moves the dial: scores above 0.7 push it up
    /// by 10%, scores below 0.3 pull it down by 10%, always inside
    /// [0.05, 0.3].
    pub fn adapt_retrieval_strategy(&mut self, feedback_score: f64, last_strategy: Strategy) {
        self.feedback
            .entry(last_strategy)
            .or_default()
            .push(feedback_score);

        if last_strategy == Strategy::Chaotic {
            if feedback_score > FEEDBACK_GOOD {
                self.chaos_factor = (self.chaos_factor * CHAOS_NUDGE_UP).min(CHAOS_FACTOR_MAX);
            } else if feedback_score < FEEDBACK_BAD {
                self.chaos_factor = (self.chaos_factor * CHAOS_NUDGE_DOWN).max(CHAOS_FACTOR_MIN);
            }
            debug!("[rag] Chaos factor now {:.3}", self.chaos_factor);
        }
    }

    /// The strategy with the highest mean feedback. Balanced until feedback
    /// says otherwise.
    pub fn get_best_strategy(&self) -> Strategy {
        let mut best = Strategy::Balanced;
        let mut best_score = f64::NEG_INFINITY;
        for strategy in Strategy::ALL {
            if let Some(scores) = self.feedback.get(&strategy) {
                if scores.is_empty() {
                    continue;
                }
                let avg = scores.iter().sum::<f64>() / scores.len() as f64;
                if avg > best_score {
                    best_score = avg;
                    best = strategy;
                }
            }
        }
        if best_score == f64::NEG_INFINITY {
            Strategy::Balanced
        } else {
            best
        }
    }

    /// Usage summary over the last 100 turns.
    pub fn rag_statistics(&self) -> RagStats {
        let recent: Vec<&RagTurn> = self.history.iter().rev().take(100).collect();
        let mut usage: HashMap<Strategy, usize> = HashMap::new();
        for turn in &recent {
            *usage.entry(turn.strategy).or_insert(0) += 1;
        }
        let mut strategies_used: Vec<(Strategy, usize)> = Strategy::ALL
            .iter()
            .filter_map(|s| usage.get(s).map(|&count| (*s, count)))
            .collect();
        strategies_used.sort_by(|a, b| b.1.cmp(&a.1));

        RagStats {
            total_queries: self.total_queries,
            recent_queries: recent.len(),
            strategies_used,
            chaos_factor: self.chaos_factor,
        }
    }
}

/// Deterministic textual rules keyed off the context labels. Applied in
/// fixed priority order; the first matching rule wins.
fn improve_response(user_input: &str, base_response: &str, context: &str) -> String {
    if context.is_empty() || base_response.is_empty() {
        return if base_response.is_empty() {
            "Hmm, interesting...".to_string()
        } else {
            base_response.to_string()
        };
    }

    let context_lower = context.to_lowercase();
    let input_lower = user_input.to_lowercase();

    let recalls_past = ["remember", "discussed", "talked"]
        .iter()
        .any(|cue| input_lower.contains(cue));
    if context_lower.contains("user:") && recalls_past {
        return format!("Yes, I remember our conversation about this. {}", base_response);
    }

    if context_lower.contains("fact:") {
        return format!(
            "Given what we have talked about before, {}",
            base_response.to_lowercase()
        );
    }

    if context_lower.contains("intuition:") {
        let lowered = base_response.to_lowercase();
        let variants = [
            format!("You know, {}, but there is another side to this...", lowered),
            format!("On one hand {}, yet intuition suggests more...", lowered),
            format!("{} Although, maybe it is not that simple.", base_response),
        ];
        let pick = (chaos_hash(user_input) * variants.len() as f64) as usize;
        return variants[pick.min(variants.len() - 1)].clone();
    }

    if context_lower.contains("connection:") {
        return format!("This reminds me of something we touched on. {}", base_response);
    }

    base_response.to_string()
}
