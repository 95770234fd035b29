// ── Fieldmind: Persistence Boundary ────────────────────────────────────────
//
// SQLite-backed durable store for memory entries, concept associations and
// the conversation log. The engine treats this layer as a collaborator that
// may be temporarily unavailable: every call returns `EngineResult`, and the
// MemoryStore degrades to in-memory-only operation when writes fail.
//
// Tables (all migrations idempotent, CREATE IF NOT EXISTS):
//   memory_entries        — one row per MemoryEntry, associations as JSON
//   concept_associations  — symmetric pairs stored once with concept1 < concept2
//   conversations         — the retrieval log (user/agent exchange per row)
//
// Concurrency: a single Mutex<Connection>. Callers must never hold the
// MemoryStore state lock across calls into this layer.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{ConversationTurn, MemoryEntry};
use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// Thread-safe database wrapper.
pub struct Persistence {
    conn: Mutex<Connection>,
}

impl Persistence {
    /// Open (or create) the database file and initialize tables.
    pub fn open(path: &Path) -> EngineResult<Self> {
        info!("[memory] Opening memory store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database. Used for tests and as the degraded mode
    /// when the on-disk store cannot be opened.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Memory entries ──────────────────────────────────────────────────

    pub fn upsert_entry(&self, entry: &MemoryEntry) -> EngineResult<()> {
        let associations = serde_json::to_string(&entry.associations)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO memory_entries
             (id, content, context, timestamp, importance, access_count, last_access, associations)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                entry.id,
                entry.content,
                entry.context,
                entry.timestamp,
                entry.importance,
                entry.access_count,
                entry.last_access,
                associations,
            ],
        )?;
        Ok(())
    }

    pub fn delete_entry(&self, id: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM memory_entries WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Load up to `capacity` entries, most important first. A malformed row
    /// (bad associations JSON) is skipped with a warning; one bad record must
    /// not abort the whole load.
    pub fn load_entries(&self, capacity: usize) -> EngineResult<Vec<MemoryEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, context, timestamp, importance, access_count, last_access, associations
             FROM memory_entries ORDER BY importance DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([capacity], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, content, context, timestamp, importance, access_count, last_access, assoc) =
                row?;
            let associations = match assoc.as_deref() {
                None | Some("") => Vec::new(),
                Some(json) => match serde_json::from_str(json) {
                    Ok(list) => list,
                    Err(e) => {
                        warn!("[memory] Skipping malformed entry {}: {}", id, e);
                        continue;
                    }
                },
            };
            entries.push(MemoryEntry {
                id,
                content,
                context,
                timestamp,
                importance,
                access_count,
                last_access,
                associations,
            });
        }
        Ok(entries)
    }

    // ── Concept associations ────────────────────────────────────────────

    /// Replace the persisted edge set with a fresh snapshot, in one
    /// transaction. Called after store/learn/decay batches — edge counts are
    /// small enough (low thousands) that a full rewrite beats diffing.
    pub fn save_associations(&self, edges: &[(String, String, f64)]) -> EngineResult<()> {
        let now = chrono::Utc::now().timestamp() as f64;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM concept_associations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO concept_associations (concept1, concept2, strength, last_update)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (c1, c2, strength) in edges {
                stmt.execute(rusqlite::params![c1, c2, strength, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_associations(&self) -> EngineResult<Vec<(String, String, f64)>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT concept1, concept2, strength FROM concept_associations")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ── Conversation log ────────────────────────────────────────────────

    pub fn log_conversation(&self, turn: &ConversationTurn) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO conversations (session_id, timestamp, user_input, agent_output)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                turn.session_id,
                turn.timestamp,
                turn.user_input,
                turn.agent_output
            ],
        )?;
        Ok(())
    }

    /// Substring search over both sides of each exchange, newest first.
    pub fn search_conversations(
        &self,
        needle: &str,
        limit: usize,
    ) -> EngineResult<Vec<(i64, ConversationTurn)>> {
        let pattern = format!("%{}%", needle);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, timestamp, user_input, agent_output FROM conversations
             WHERE user_input LIKE ?1 OR agent_output LIKE ?1
             ORDER BY timestamp DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(rusqlite::params![pattern, limit], map_conversation_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Uniform random sample of logged exchanges. `n == 0` returns nothing.
    pub fn sample_conversations(&self, n: usize) -> EngineResult<Vec<(i64, ConversationTurn)>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, timestamp, user_input, agent_output FROM conversations
             ORDER BY RANDOM() LIMIT ?1",
        )?;
        let rows = stmt.query_map([n], map_conversation_row)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn conversation_count(&self) -> EngineResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

fn map_conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, ConversationTurn)> {
    Ok((
        row.get::<_, i64>(0)?,
        ConversationTurn {
            session_id: row.get(1)?,
            timestamp: row.get(2)?,
            user_input: row.get(3)?,
            agent_output: row.get(4)?,
        },
    ))
}

/// Run schema migrations. All statements are idempotent.
fn run_migrations(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = "
    -- ═══════════════════════════════════════════════════════════════
    -- Memory Entries (long-term store)
    -- ═══════════════════════════════════════════════════════════════
    CREATE TABLE IF NOT EXISTS memory_entries (
        id TEXT PRIMARY KEY,
        content TEXT NOT NULL,
        context TEXT NOT NULL DEFAULT '',
        timestamp REAL NOT NULL,
        importance REAL NOT NULL DEFAULT 0.5,
        access_count INTEGER NOT NULL DEFAULT 0,
        last_access REAL NOT NULL DEFAULT 0,
        associations TEXT NOT NULL DEFAULT '[]'
    );

    CREATE INDEX IF NOT EXISTS idx_entries_importance
        ON memory_entries(importance DESC);
    CREATE INDEX IF NOT EXISTS idx_entries_timestamp
        ON memory_entries(timestamp);

    -- ═══════════════════════════════════════════════════════════════
    -- Concept Associations (symmetric pairs, stored once, c1 < c2)
    -- ═══════════════════════════════════════════════════════════════
    CREATE TABLE IF NOT EXISTS concept_associations (
        concept1 TEXT NOT NULL,
        concept2 TEXT NOT NULL,
        strength REAL NOT NULL,
        last_update REAL NOT NULL DEFAULT 0,
        PRIMARY KEY (concept1, concept2)
    );

    -- ═══════════════════════════════════════════════════════════════
    -- Conversation Log (retrieval collaborator)
    -- ═══════════════════════════════════════════════════════════════
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL DEFAULT '',
        timestamp REAL NOT NULL,
        user_input TEXT NOT NULL,
        agent_output TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_conversations_session
        ON conversations(session_id);
    CREATE INDEX IF NOT EXISTS idx_conversations_time
        ON conversations(timestamp);
";
