// ── Fieldmind Atoms: Constants ─────────────────────────────────────────────
// All named constants for the crate live here.
// Rationale: collecting constants in one place eliminates magic numbers,
// makes auditing easier, and keeps every layer's code self-documenting.

// ── Memory store defaults ──────────────────────────────────────────────────
// Used by `MemoryConfig::default()` and the maintenance loop.
//
// Background: the consolidation pass compares every cached pair of entries,
// which is O(n²) in cache size. The cache capacity is therefore an explicit,
// configurable working-set ceiling rather than an open-ended population.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
pub const DEFAULT_CONSOLIDATION_THRESHOLD: f64 = 0.8;
pub const DEFAULT_FORGET_AGE_SECS: f64 = 7.0 * 24.0 * 3600.0; // 7 days
pub const DEFAULT_DECAY_FACTOR: f64 = 0.99;
pub const DEFAULT_MAINTENANCE_INTERVAL_SECS: u64 = 3600; // hourly

/// Edges below this weight are pruned during decay.
pub const ASSOCIATION_PRUNE_FLOOR: f64 = 0.01;

/// Associative-context expansion: minimum edge strength per hop.
pub const HOP1_MIN_STRENGTH: f64 = 0.5;
pub const HOP2_MIN_STRENGTH: f64 = 0.3;

/// Recall over-fetch multiplier: the index is asked for `limit * 3`
/// candidates before importance filtering and re-ranking.
pub const RECALL_OVERFETCH: usize = 3;

// ── Importance heuristics ──────────────────────────────────────────────────
// Used by `MemoryStore::learn_from_conversation` when no explicit importance
// override is supplied. Additive bonuses on a 0.5 base, clamped to [0,1].
pub const IMPORTANCE_BASE: f64 = 0.5;
pub const IMPORTANCE_LONG_INPUT: f64 = 0.2;
pub const IMPORTANCE_QUESTION: f64 = 0.1;
pub const IMPORTANCE_PERSONAL: f64 = 0.3;
pub const IMPORTANCE_EMOTIONAL: f64 = 0.2;
pub const LONG_INPUT_CHARS: usize = 50;

/// First-person tokens that mark personal information worth remembering.
pub const PERSONAL_WORDS: &[&str] = &["i", "me", "my", "mine", "myself", "im", "i'm"];

/// Fixed emotional keyword list for importance scoring and the emotional
/// resonance buckets. Deliberately small: this is a signal, not a sentiment
/// model.
pub const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "happy", "wonderful", "awesome", "excited", "joy", "like",
];
pub const NEGATIVE_WORDS: &[&str] = &[
    "hate", "terrible", "sad", "angry", "awful", "problem", "afraid", "upset",
];
pub const NEUTRAL_WORDS: &[&str] = &["okay", "fine", "normal", "maybe", "whatever"];

// ── Metrics ────────────────────────────────────────────────────────────────
/// Global metric history is bounded to this many snapshots.
pub const METRIC_HISTORY_CAP: usize = 1000;
/// Engagement tracker sliding window (message lengths).
pub const ENGAGEMENT_WINDOW: usize = 20;
/// Perplexity is capped at this ceiling (smoothed unigram model).
pub const PERPLEXITY_CAP: f64 = 100.0;
/// Coherence is computed over this many trailing session messages.
pub const COHERENCE_WINDOW: usize = 6;
/// Pair resonance below this threshold does not count as a connection in
/// global coherence.
pub const COHERENCE_LINK_THRESHOLD: f64 = 0.1;

// ── Retrieval / RAG ────────────────────────────────────────────────────────
/// Deterministic match cap inside `retrieve_context` (before fusion).
pub const RETRIEVE_DETERMINISTIC_CAP: usize = 10;
/// Random sample size is `CHAOS_SAMPLE_SCALE * chaos_level`, truncated.
pub const CHAOS_SAMPLE_SCALE: f64 = 20.0;
/// Adaptive chaos factor bounds and nudge rates.
pub const CHAOS_FACTOR_MIN: f64 = 0.05;
pub const CHAOS_FACTOR_MAX: f64 = 0.3;
pub const CHAOS_FACTOR_DEFAULT: f64 = 0.1;
pub const CHAOS_NUDGE_UP: f64 = 1.1;
pub const CHAOS_NUDGE_DOWN: f64 = 0.9;
pub const FEEDBACK_GOOD: f64 = 0.7;
pub const FEEDBACK_BAD: f64 = 0.3;
/// RAG turn history cap.
pub const RAG_HISTORY_CAP: usize = 500;
