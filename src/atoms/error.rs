// ── Fieldmind Atoms: Error Types ───────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Data, Config).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • Empty input is NOT an error anywhere in this crate: empty text, empty
//     corpora and empty networks produce neutral defaults (entropy 0, zero
//     vectors, empty lists). Only out-of-range parameters and broken
//     collaborators surface as errors.
//   • A persistence failure during recall degrades to in-memory operation and
//     is logged; it is only returned to the caller on an explicit durable
//     write.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite / rusqlite database failure (persistent store unreachable or corrupt).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A malformed persisted record. Batch loads skip the offending row and
    /// continue; this variant surfaces only when a single-record operation
    /// cannot produce a result at all.
    #[error("Data error: {0}")]
    Data(String),

    /// Out-of-range or inconsistent parameter (negative limit, importance
    /// outside [0,1], chaos level outside [0,1]). Rejected synchronously.
    #[error("Configuration error: {0}")]
    Config(String),
}

// ── Migration bridge: String → EngineError ─────────────────────────────────
// Allows `?` on helpers still returning `Result<T, String>` inside functions
// that return `EngineResult<T>`.

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Data(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Data(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations should return this type.
pub type EngineResult<T> = Result<T, EngineError>;

// ── Conversion: EngineError → String ──────────────────────────────────────
// Lets embedding applications with `Result<T, String>` boundaries call
// `.map_err(EngineError::into)` directly.

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}
