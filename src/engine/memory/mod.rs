// ── Fieldmind: Memory Engine ───────────────────────────────────────────────
//
// Long-term associative memory: a bounded in-memory working set with a
// multi-gram inverted index and a weighted concept graph, backed by SQLite.
//
// Module map:
//   index        — SemanticIndex, n-gram inverted index with weighted search
//   network      — AssociativeNetwork, symmetric concept graph with decay
//   persistence  — SQLite boundary (entries, edges, conversation log)
//   store        — MemoryStore, the orchestrating facade
//   maintenance  — consolidate/forget/decay pass + background loop

pub mod index;
pub mod maintenance;
pub mod network;
pub mod persistence;
pub mod store;

pub use maintenance::{run_maintenance, spawn_maintenance, MaintenanceReport};
pub use store::MemoryStore;
