// ── Fieldmind Atoms: Pure Data Types ───────────────────────────────────────
// All plain struct/enum definitions with no logic beyond constructors and
// small accessors. Atoms layer rule: no I/O, no side effects, no imports
// from engine/.

use crate::atoms::constants::{
    CHAOS_FACTOR_DEFAULT, DEFAULT_CACHE_CAPACITY, DEFAULT_CONSOLIDATION_THRESHOLD,
    DEFAULT_DECAY_FACTOR, DEFAULT_FORGET_AGE_SECS, DEFAULT_MAINTENANCE_INTERVAL_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 1: Memory Entries
// ═══════════════════════════════════════════════════════════════════════════

/// One long-term memory record: free-text content plus retrieval metadata.
///
/// Timestamps are f64 epoch seconds. `importance` is kept in [0,1] by every
/// constructor path; `access_count`/`last_access` are bumped on recall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    /// Time-derived unique id (`mem_<epoch_micros>`, `merged_<epoch_micros>`).
    pub id: String,
    pub content: String,
    /// Free-text tag describing where the content came from.
    pub context: String,
    /// Creation time, epoch seconds.
    pub timestamp: f64,
    /// Retrieval weight in [0,1].
    pub importance: f64,
    pub access_count: u32,
    /// Last recall time, epoch seconds (0.0 = never recalled).
    pub last_access: f64,
    /// Related concept/entry labels, order preserved.
    pub associations: Vec<String>,
}

impl MemoryEntry {
    /// Age in seconds relative to `now` (epoch seconds).
    pub fn age_secs(&self, now: f64) -> f64 {
        (now - self.timestamp).max(0.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 2: Conversation Log
// ═══════════════════════════════════════════════════════════════════════════

/// One logged exchange, consumed by the retriever for both deterministic and
/// randomized sampling. Persisted in the `conversations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub session_id: String,
    pub user_input: String,
    pub agent_output: String,
    /// Epoch seconds.
    pub timestamp: f64,
}

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 3: Metrics
// ═══════════════════════════════════════════════════════════════════════════

/// Immutable per-turn metric record. Appended to a bounded global history and
/// a per-session list; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: f64,
    pub entropy: f64,
    pub perplexity: f64,
    pub resonance: f64,
    pub coherence: f64,
    pub engagement: f64,
    pub transformer_id: String,
    pub session_id: String,
}

/// One flagged outlier from `detect_anomalies`: a metric point more than two
/// standard deviations from the recent mean.
#[derive(Debug, Clone, Serialize)]
pub struct MetricAnomaly {
    pub metric: &'static str,
    pub value: f64,
    pub expected_low: f64,
    pub expected_high: f64,
    pub timestamp: f64,
    pub transformer_id: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 4: Retrieval
// ═══════════════════════════════════════════════════════════════════════════

/// Where a retrieved item came from. Chaos-sourced items are kept distinct so
/// augmentation strategies can select on provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalSource {
    /// Keyword/substring match against the conversation log.
    Deterministic,
    /// Uniform random sample, relevance boosted by the chaos hash.
    Chaotic,
}

/// One scored item returned by `retrieve_context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// Conversation-log row id (`conv_<rowid>`).
    pub id: String,
    /// Formatted `"User: … | Agent: …"` exchange text.
    pub content: String,
    pub source: RetrievalSource,
    pub relevance: f64,
    pub timestamp: f64,
}

/// Closed set of context-augmentation strategies. String keys from the wire
/// map onto this enum at the boundary; internal dispatch is a plain `match`
/// so every strategy is statically enumerable and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Top relevant facts only.
    Factual,
    /// Every other retrieved item, as loose inspiration.
    Creative,
    /// Only the randomly-sourced items.
    Chaotic,
    /// One high-relevance fact + one mid-relevance connection + one chaotic item.
    Balanced,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Factual,
        Strategy::Creative,
        Strategy::Chaotic,
        Strategy::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Factual => "factual",
            Strategy::Creative => "creative",
            Strategy::Chaotic => "chaotic",
            Strategy::Balanced => "balanced",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 5: Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Tunables for the memory store and its maintenance pass.
///
/// `cache_capacity` bounds the in-memory working set (and therefore the O(n²)
/// consolidation cost). `db_path = None` runs fully in memory.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub db_path: Option<PathBuf>,
    pub cache_capacity: usize,
    pub consolidation_threshold: f64,
    pub forget_age_secs: f64,
    pub decay_factor: f64,
    pub maintenance_interval_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            consolidation_threshold: DEFAULT_CONSOLIDATION_THRESHOLD,
            forget_age_secs: DEFAULT_FORGET_AGE_SECS,
            decay_factor: DEFAULT_DECAY_FACTOR,
            maintenance_interval_secs: DEFAULT_MAINTENANCE_INTERVAL_SECS,
        }
    }
}

impl MemoryConfig {
    /// In-memory config for tests and ephemeral sessions.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Persistent config backed by a SQLite file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }
}

/// Tunables for the RAG layer.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Baseline chaos factor used when a call does not pass an explicit
    /// `chaos_level`. Adapted by feedback within [0.05, 0.3].
    pub chaos_factor: f64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chaos_factor: CHAOS_FACTOR_DEFAULT,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SECTION 6: Statistics
// ═══════════════════════════════════════════════════════════════════════════

/// Summary counts over the live memory cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub avg_importance: f64,
    pub max_importance: f64,
    pub avg_access_count: f64,
    pub total_associations: usize,
}

/// Summary of the RAG layer's recent behavior.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RagStats {
    pub total_queries: usize,
    pub recent_queries: usize,
    /// (strategy, uses) over the recent window.
    pub strategies_used: Vec<(Strategy, usize)>,
    pub chaos_factor: f64,
}
