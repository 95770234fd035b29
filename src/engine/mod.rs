// ── Fieldmind Engine Layer ─────────────────────────────────────────────────
// All behavior lives here, on top of the pure atoms layer:
//   tokenizer  — shared text tokenization
//   memory     — index + graph + SQLite-backed store + maintenance
//   vectorizer — from-scratch TF-IDF and cosine utilities
//   metrics    — conversation quality analytics
//   rag        — hybrid deterministic/chaotic retrieval and augmentation

pub mod memory;
pub mod metrics;
pub mod rag;
pub mod tokenizer;
pub mod vectorizer;
