// ── Fieldmind: Memory Store ────────────────────────────────────────────────
//
// Orchestrates the cache, semantic index, associative network and the SQLite
// boundary into one long-term memory facade.
//
// Lock discipline: a single Mutex guards the (cache, index, network) triple so
// they can never disagree about which entries exist. Persistence I/O always
// happens after that lock is released; rows to write are collected under the
// lock and flushed afterwards. A failed write degrades to in-memory operation
// with a warning, it never fails the caller's recall path.

use crate::atoms::constants::{
    HOP1_MIN_STRENGTH, HOP2_MIN_STRENGTH, IMPORTANCE_BASE, IMPORTANCE_EMOTIONAL,
    IMPORTANCE_LONG_INPUT, IMPORTANCE_PERSONAL, IMPORTANCE_QUESTION, LONG_INPUT_CHARS,
    NEGATIVE_WORDS, PERSONAL_WORDS, POSITIVE_WORDS, RECALL_OVERFETCH,
};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{ConversationTurn, MemoryConfig, MemoryEntry, MemoryStats};
use crate::engine::memory::index::SemanticIndex;
use crate::engine::memory::network::AssociativeNetwork;
use crate::engine::memory::persistence::Persistence;
use crate::engine::tokenizer::extract_words;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Mutable engine state. Guarded as one unit so the cache, the index postings
/// and the concept graph stay consistent with each other.
struct MemoryState {
    cache: HashMap<String, MemoryEntry>,
    index: SemanticIndex,
    network: AssociativeNetwork,
    /// Monotonic guard for time-derived ids: two stores in the same
    /// microsecond still get distinct ids.
    last_id_micros: u64,
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
    persistence: Persistence,
    config: MemoryConfig,
}

impl MemoryStore {
    /// Open the store, loading persisted entries and associations. A database
    /// that cannot be opened on disk degrades to an in-memory database.
    pub fn new(config: MemoryConfig) -> EngineResult<Self> {
        let persistence = match &config.db_path {
            Some(path) => match Persistence::open(path) {
                Ok(p) => p,
                Err(e) => {
                    warn!(
                        "[memory] Could not open database at {:?} ({}), running in-memory",
                        path, e
                    );
                    Persistence::open_in_memory()?
                }
            },
            None => Persistence::open_in_memory()?,
        };

        let mut state = MemoryState {
            cache: HashMap::new(),
            index: SemanticIndex::new(),
            network: AssociativeNetwork::new(),
            last_id_micros: 0,
        };

        let entries = persistence.load_entries(config.cache_capacity)?;
        for entry in entries {
            state.index.index_entry(&entry);
            state.cache.insert(entry.id.clone(), entry);
        }
        for (c1, c2, strength) in persistence.load_associations()? {
            state.network.set_association(&c1, &c2, strength);
        }
        info!(
            "[memory] Store ready: {} entries, {} association edges",
            state.cache.len(),
            state.network.edge_count()
        );

        Ok(Self {
            state: Mutex::new(state),
            persistence,
            config,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // ── Store ───────────────────────────────────────────────────────────

    /// Store a new memory. Returns its id.
    ///
    /// Besides caching and indexing, every ordered pair of content tokens is
    /// linked in the associative network with strength
    /// `importance / (1 + distance * 0.1)` — adjacent words bind tighter than
    /// distant ones.
    pub fn store_memory(
        &self,
        content: &str,
        context: &str,
        importance: f64,
        associations: Vec<String>,
    ) -> EngineResult<String> {
        if !(0.0..=1.0).contains(&importance) {
            return Err(EngineError::Config(format!(
                "importance must be within [0, 1], got {}",
                importance
            )));
        }

        let now = chrono::Utc::now();
        let timestamp = now.timestamp_micros() as f64 / 1e6;
        let words = extract_words(content);

        let (entry, evicted, edges) = {
            let mut state = self.state.lock();
            let micros = (now.timestamp_micros() as u64).max(state.last_id_micros + 1);
            state.last_id_micros = micros;

            let entry = MemoryEntry {
                id: format!("mem_{}", micros),
                content: content.to_string(),
                context: context.to_string(),
                timestamp,
                importance,
                access_count: 0,
                last_access: 0.0,
                associations,
            };
            state.index.index_entry(&entry);
            state.cache.insert(entry.id.clone(), entry.clone());

            for i in 0..words.len() {
                for j in (i + 1)..words.len() {
                    let distance = (j - i) as f64;
                    let strength = importance / (1.0 + distance * 0.1);
                    state.network.add_association(&words[i], &words[j], strength);
                }
            }

            let evicted = self.evict_over_capacity(&mut state);
            (entry, evicted, state.network.edge_snapshot())
        };

        if let Err(e) = self.persistence.upsert_entry(&entry) {
            warn!("[memory] Persist failed for {}: {}", entry.id, e);
        }
        if let Err(e) = self.persistence.save_associations(&edges) {
            warn!("[memory] Association persist failed: {}", e);
        }
        if evicted > 0 {
            debug!("[memory] Evicted {} entries over cache capacity", evicted);
        }
        Ok(entry.id)
    }

    /// Drop the weakest entries when the cache exceeds capacity. Evicted
    /// entries remain on disk; they just leave the working set.
    fn evict_over_capacity(&self, state: &mut MemoryState) -> usize {
        let mut evicted = 0;
        while state.cache.len() > self.config.cache_capacity {
            let victim = state
                .cache
                .values()
                .min_by(|a, b| {
                    a.importance
                        .partial_cmp(&b.importance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| {
                            a.timestamp
                                .partial_cmp(&b.timestamp)
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                })
                .map(|e| e.id.clone());
            let Some(id) = victim else { break };
            if let Some(entry) = state.cache.remove(&id) {
                state.index.remove_entry(&entry);
                evicted += 1;
            }
        }
        evicted
    }

    // ── Recall ──────────────────────────────────────────────────────────

    /// Recall up to `limit` memories relevant to `query`, most relevant first.
    ///
    /// The index is over-fetched, candidates below `min_importance` are
    /// dropped, and survivors are re-ranked by
    /// `importance*0.5 + recency*0.3 + (ln(1+access_count)/10)*0.2` where
    /// `recency = 1 / (1 + age_days)`. Returned entries get their access
    /// statistics bumped.
    pub fn recall_memories(
        &self,
        query: &str,
        limit: usize,
        min_importance: f64,
    ) -> EngineResult<Vec<MemoryEntry>> {
        if limit == 0 {
            return Err(EngineError::Config("recall limit must be > 0".into()));
        }
        let now = chrono::Utc::now().timestamp() as f64;

        let (results, touched) = {
            let mut state = self.state.lock();
            let candidates = state.index.search(query, limit * RECALL_OVERFETCH);

            let mut scored: Vec<(String, f64)> = candidates
                .iter()
                .filter_map(|(id, _)| state.cache.get(id))
                .filter(|entry| entry.importance >= min_importance)
                .map(|entry| {
                    let age_days = entry.age_secs(now) / 86_400.0;
                    let recency = 1.0 / (1.0 + age_days);
                    let frequency = (1.0 + entry.access_count as f64).ln() / 10.0;
                    let score = entry.importance * 0.5 + recency * 0.3 + frequency * 0.2;
                    (entry.id.clone(), score)
                })
                .collect();
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            scored.truncate(limit);

            let mut results = Vec::with_capacity(scored.len());
            for (id, _) in &scored {
                if let Some(entry) = state.cache.get_mut(id) {
                    entry.access_count += 1;
                    entry.last_access = now;
                    results.push(entry.clone());
                }
            }
            (results.clone(), results)
        };

        for entry in &touched {
            if let Err(e) = self.persistence.upsert_entry(entry) {
                warn!("[memory] Access-stat persist failed for {}: {}", entry.id, e);
            }
        }
        Ok(results)
    }

    /// Concepts reachable from the query through strong association edges.
    ///
    /// Hop 1 follows edges above 0.5 (top 3 per query token); further hops up
    /// to `depth` follow edges above 0.3 (top 2 per frontier concept). Returns
    /// the sorted union of reached concept labels, query tokens excluded.
    pub fn get_associative_context(&self, query: &str, depth: usize) -> Vec<String> {
        let words = extract_words(query);
        if words.is_empty() || depth == 0 {
            return Vec::new();
        }

        let state = self.state.lock();
        let mut reached: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        let mut frontier: Vec<String> = Vec::new();

        for word in &words {
            for (concept, strength) in state.network.get_related_concepts(word, 3) {
                if strength > HOP1_MIN_STRENGTH && !words.contains(&concept) {
                    reached.insert(concept.clone());
                    frontier.push(concept);
                }
            }
        }

        for _ in 1..depth {
            let mut next = Vec::new();
            for concept in &frontier {
                for (neighbor, strength) in state.network.get_related_concepts(concept, 2) {
                    if strength > HOP2_MIN_STRENGTH
                        && !words.contains(&neighbor)
                        && reached.insert(neighbor.clone())
                    {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        reached.into_iter().collect()
    }

    // ── Consolidation / forgetting / decay ──────────────────────────────

    /// Merge near-duplicate memories. Similarity between two entries is
    /// `0.7 * Jaccard(content tokens) + 0.3 * (1 / (1 + |Δt| hours))`; pairs
    /// at or above `threshold` merge into one entry whose content and context
    /// each join both sides with " | ". Returns the number of merges
    /// performed.
    ///
    /// Pairwise over the cache, so O(n²) in working-set size. The capacity
    /// ceiling in MemoryConfig exists to keep this pass bounded.
    pub fn consolidate_memories(&self, threshold: f64) -> EngineResult<usize> {
        let (merged_count, removed_ids, new_entries, edges) = {
            let mut state = self.state.lock();

            let mut entries: Vec<MemoryEntry> = state.cache.values().cloned().collect();
            entries.sort_by(|a, b| {
                a.timestamp
                    .partial_cmp(&b.timestamp)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });

            let word_sets: Vec<std::collections::HashSet<String>> = entries
                .iter()
                .map(|e| extract_words(&e.content).into_iter().collect())
                .collect();

            let mut consumed = vec![false; entries.len()];
            let mut removed_ids = Vec::new();
            let mut new_entries = Vec::new();
            let mut merged_count = 0;

            for i in 0..entries.len() {
                if consumed[i] {
                    continue;
                }
                for j in (i + 1)..entries.len() {
                    if consumed[j] {
                        continue;
                    }
                    let sim = pair_similarity(
                        &word_sets[i],
                        &word_sets[j],
                        entries[i].timestamp,
                        entries[j].timestamp,
                    );
                    if sim < threshold {
                        continue;
                    }

                    let merged = merge_entries(&entries[i], &entries[j], &mut state.last_id_micros);
                    debug!(
                        "[memory] Consolidating {} + {} -> {} (sim {:.2})",
                        entries[i].id, entries[j].id, merged.id, sim
                    );

                    for old in [&entries[i], &entries[j]] {
                        if let Some(e) = state.cache.remove(&old.id) {
                            state.index.remove_entry(&e);
                        }
                        removed_ids.push(old.id.clone());
                    }
                    state.index.index_entry(&merged);
                    state.cache.insert(merged.id.clone(), merged.clone());
                    new_entries.push(merged);

                    consumed[i] = true;
                    consumed[j] = true;
                    merged_count += 1;
                    break;
                }
            }

            (
                merged_count,
                removed_ids,
                new_entries,
                state.network.edge_snapshot(),
            )
        };

        for id in &removed_ids {
            if let Err(e) = self.persistence.delete_entry(id) {
                warn!("[memory] Delete failed for {}: {}", id, e);
            }
        }
        for entry in &new_entries {
            if let Err(e) = self.persistence.upsert_entry(entry) {
                warn!("[memory] Persist failed for {}: {}", entry.id, e);
            }
        }
        if merged_count > 0 {
            if let Err(e) = self.persistence.save_associations(&edges) {
                warn!("[memory] Association persist failed: {}", e);
            }
            info!("[memory] Consolidated {} memory pairs", merged_count);
        }
        Ok(merged_count)
    }

    /// Evict stale, unimportant, rarely-touched memories: older than
    /// `age_threshold_secs` AND importance below 0.3 AND accessed fewer than
    /// two times. All three must hold. Returns the eviction count.
    pub fn forget_old_memories(&self, age_threshold_secs: f64) -> EngineResult<usize> {
        let now = chrono::Utc::now().timestamp() as f64;

        let forgotten: Vec<String> = {
            let mut state = self.state.lock();
            let victims: Vec<String> = state
                .cache
                .values()
                .filter(|e| {
                    e.age_secs(now) > age_threshold_secs
                        && e.importance < 0.3
                        && e.access_count < 2
                })
                .map(|e| e.id.clone())
                .collect();
            for id in &victims {
                if let Some(entry) = state.cache.remove(id) {
                    state.index.remove_entry(&entry);
                }
            }
            victims
        };

        for id in &forgotten {
            if let Err(e) = self.persistence.delete_entry(id) {
                warn!("[memory] Delete failed for {}: {}", id, e);
            }
        }
        if !forgotten.is_empty() {
            info!("[memory] Forgot {} stale memories", forgotten.len());
        }
        Ok(forgotten.len())
    }

    /// Decay all association edges by the configured factor, pruning edges
    /// that fall below the floor. Returns the pruned edge count.
    pub fn decay_associations(&self) -> EngineResult<usize> {
        let (pruned, edges) = {
            let mut state = self.state.lock();
            let pruned = state.network.decay_associations(self.config.decay_factor);
            (pruned, state.network.edge_snapshot())
        };
        if let Err(e) = self.persistence.save_associations(&edges) {
            warn!("[memory] Association persist failed: {}", e);
        }
        Ok(pruned)
    }

    // ── Conversation integration ────────────────────────────────────────

    /// Build a context block for a reply to `current_input`: up to three
    /// relevant memory previews plus at most ten depth-1 associative
    /// concepts. Returns an empty string when nothing relevant exists.
    pub fn get_conversation_context(&self, current_input: &str) -> EngineResult<String> {
        let memories = self.recall_memories(current_input, 3, 0.1)?;
        let mut concepts = self.get_associative_context(current_input, 1);
        concepts.truncate(10);

        let mut parts = Vec::new();
        if !memories.is_empty() {
            let previews: Vec<String> = memories
                .iter()
                .map(|m| format!("- {}", truncate_chars(&m.content, 100)))
                .collect();
            parts.push(format!("Relevant memories:\n{}", previews.join("\n")));
        }
        if !concepts.is_empty() {
            parts.push(format!("Related concepts: {}", concepts.join(", ")));
        }
        Ok(parts.join("\n"))
    }

    /// Learn one exchange. When `importance` is None it is derived from the
    /// user input: 0.5 base, +0.2 long input, +0.1 question mark, +0.3
    /// personal pronoun, +0.2 emotional keyword, clamped to [0, 1].
    ///
    /// The stored content is `"User: {input} | Agent: {output}"`; every user
    /// token is then cross-linked to every agent token at the computed
    /// importance, and the raw exchange lands in the conversation log for the
    /// retriever. Returns the new memory id.
    pub fn learn_from_conversation(
        &self,
        user_input: &str,
        agent_output: &str,
        session_context: &str,
        importance: Option<f64>,
    ) -> EngineResult<String> {
        let importance = importance.unwrap_or_else(|| auto_importance(user_input));
        let content = format!("User: {} | Agent: {}", user_input, agent_output);
        let context = if session_context.is_empty() {
            "conversation"
        } else {
            session_context
        };

        let id = self.store_memory(&content, context, importance, Vec::new())?;

        let user_words = extract_words(user_input);
        let agent_words = extract_words(agent_output);
        if !user_words.is_empty() && !agent_words.is_empty() {
            let edges = {
                let mut state = self.state.lock();
                for uw in &user_words {
                    for aw in &agent_words {
                        state.network.add_association(uw, aw, importance);
                    }
                }
                state.network.edge_snapshot()
            };
            if let Err(e) = self.persistence.save_associations(&edges) {
                warn!("[memory] Association persist failed: {}", e);
            }
        }

        let turn = ConversationTurn {
            session_id: session_context.to_string(),
            user_input: user_input.to_string(),
            agent_output: agent_output.to_string(),
            timestamp: chrono::Utc::now().timestamp() as f64,
        };
        if let Err(e) = self.persistence.log_conversation(&turn) {
            warn!("[memory] Conversation log failed: {}", e);
        }

        Ok(id)
    }

    // ── Conversation log access (used by the retriever) ─────────────────

    pub fn search_conversations(
        &self,
        needle: &str,
        limit: usize,
    ) -> EngineResult<Vec<(i64, ConversationTurn)>> {
        self.persistence.search_conversations(needle, limit)
    }

    pub fn sample_conversations(&self, n: usize) -> EngineResult<Vec<(i64, ConversationTurn)>> {
        self.persistence.sample_conversations(n)
    }

    pub fn conversation_count(&self) -> EngineResult<usize> {
        self.persistence.conversation_count()
    }

    // ── Statistics ──────────────────────────────────────────────────────

    pub fn memory_statistics(&self) -> MemoryStats {
        let state = self.state.lock();
        let total = state.cache.len();
        if total == 0 {
            return MemoryStats::default();
        }
        let sum_importance: f64 = state.cache.values().map(|e| e.importance).sum();
        let max_importance = state
            .cache
            .values()
            .map(|e| e.importance)
            .fold(0.0, f64::max);
        let sum_access: u64 = state.cache.values().map(|e| e.access_count as u64).sum();
        MemoryStats {
            total_memories: total,
            avg_importance: sum_importance / total as f64,
            max_importance,
            avg_access_count: sum_access as f64 / total as f64,
            total_associations: state.network.edge_count(),
        }
    }

    /// Strength-ordered neighbors of a concept. Thin pass-through for callers
    /// outside the memory module.
    pub fn related_concepts(&self, concept: &str, limit: usize) -> Vec<(String, f64)> {
        self.state.lock().network.get_related_concepts(concept, limit)
    }

    #[cfg(test)]
    pub(crate) fn cached_entry(&self, id: &str) -> Option<MemoryEntry> {
        self.state.lock().cache.get(id).cloned()
    }

    #[cfg(test)]
    pub(crate) fn backdate_entry(&self, id: &str, seconds: f64) {
        let mut state = self.state.lock();
        if let Some(entry) = state.cache.get_mut(id) {
            entry.timestamp -= seconds;
        }
    }
}

/// Consolidation similarity: mostly token overlap, tempered by how far apart
/// in time the two entries were formed.
fn pair_similarity(
    words_a: &std::collections::HashSet<String>,
    words_b: &std::collections::HashSet<String>,
    ts_a: f64,
    ts_b: f64,
) -> f64 {
    let union = words_a.union(words_b).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        words_a.intersection(words_b).count() as f64 / union as f64
    };
    let hours_apart = (ts_a - ts_b).abs() / 3600.0;
    let time_proximity = 1.0 / (1.0 + hours_apart);
    0.7 * jaccard + 0.3 * time_proximity
}

fn merge_entries(a: &MemoryEntry, b: &MemoryEntry, last_id_micros: &mut u64) -> MemoryEntry {
    let micros = (chrono::Utc::now().timestamp_micros() as u64).max(*last_id_micros + 1);
    *last_id_micros = micros;

    let mut associations = a.associations.clone();
    for assoc in &b.associations {
        if !associations.contains(assoc) {
            associations.push(assoc.clone());
        }
    }
    MemoryEntry {
        id: format!("merged_{}", micros),
        content: format!("{} | {}", a.content, b.content),
        context: format!("{} | {}", a.context, b.context),
        timestamp: a.timestamp.max(b.timestamp),
        importance: a.importance.max(b.importance),
        access_count: a.access_count + b.access_count,
        last_access: a.last_access.max(b.last_access),
        associations,
    }
}

/// Importance heuristic over the raw user input. Length is checked in
/// characters; keyword checks are token-exact after punctuation stripping.
fn auto_importance(user_input: &str) -> f64 {
    let mut importance = IMPORTANCE_BASE;
    if user_input.chars().count() > LONG_INPUT_CHARS {
        importance += IMPORTANCE_LONG_INPUT;
    }
    if user_input.contains('?') {
        importance += IMPORTANCE_QUESTION;
    }
    let tokens: Vec<String> = user_input
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .collect();
    if tokens.iter().any(|t| PERSONAL_WORDS.contains(&t.as_str())) {
        importance += IMPORTANCE_PERSONAL;
    }
    if tokens.iter().any(|t| {
        POSITIVE_WORDS.contains(&t.as_str()) || NEGATIVE_WORDS.contains(&t.as_str())
    }) {
        importance += IMPORTANCE_EMOTIONAL;
    }
    importance.clamp(0.0, 1.0)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
