// ── Fieldmind ──────────────────────────────────────────────────────────────
//
// Semantic memory and retrieval engine for conversational agents: a
// multi-gram inverted index, a decaying associative concept graph,
// from-scratch TF-IDF, a text-quality metrics suite, and a hybrid
// deterministic/chaotic RAG pipeline. No model weights, no vector database;
// everything is counted, hashed, or looked up.
//
// Layering:
//   atoms/   pure data types, constants, the error enum
//   engine/  all behavior (memory, vectorizer, metrics, rag)

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{
    ConversationTurn, MemoryConfig, MemoryEntry, MemoryStats, MetricAnomaly, MetricSnapshot,
    RagConfig, RagStats, RetrievalSource, RetrievedItem, Strategy,
};
pub use engine::memory::{run_maintenance, spawn_maintenance, MaintenanceReport, MemoryStore};
pub use engine::metrics::{MetricsCore, SessionAnalytics, TransformerPerformance};
pub use engine::rag::{ChaoticRetriever, ContextAugmenter, FieldRag};
pub use engine::vectorizer::{cosine_similarity, find_nearest_neighbors, TermVectorizer};
