// ── Fieldmind: Semantic Index ──────────────────────────────────────────────
//
// Inverted index over unigrams, adjacent bigrams and adjacent trigrams.
// No vector database, no embeddings: multi-gram overlap stands in for
// semantic similarity at conversational scale.
//
// Search weighting: a trigram hit outranks a bigram hit outranks a unigram
// hit (weights 3/2/1); each entry is counted once at its highest matching
// gram level. Results are a *ranked sequence* of (id, weight) pairs — rank
// order is part of the contract, callers must not collapse it into a set.

use crate::atoms::types::MemoryEntry;
use crate::engine::tokenizer::{bigram_keys, extract_words, trigram_keys};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct SemanticIndex {
    unigrams: HashMap<String, HashSet<String>>,
    bigrams: HashMap<String, HashSet<String>>,
    trigrams: HashMap<String, HashSet<String>>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry's `content + " " + context` under all gram levels.
    pub fn index_entry(&mut self, entry: &MemoryEntry) {
        let words = extract_words(&format!("{} {}", entry.content, entry.context));

        for word in &words {
            self.unigrams
                .entry(word.clone())
                .or_default()
                .insert(entry.id.clone());
        }
        for key in bigram_keys(&words) {
            self.bigrams.entry(key).or_default().insert(entry.id.clone());
        }
        for key in trigram_keys(&words) {
            self.trigrams.entry(key).or_default().insert(entry.id.clone());
        }
    }

    /// Remove an entry's postings. Used when consolidation replaces two
    /// originals with a merged entry and when forgetting evicts an entry.
    pub fn remove_entry(&mut self, entry: &MemoryEntry) {
        let words = extract_words(&format!("{} {}", entry.content, entry.context));

        for word in &words {
            if let Some(ids) = self.unigrams.get_mut(word) {
                ids.remove(&entry.id);
                if ids.is_empty() {
                    self.unigrams.remove(word);
                }
            }
        }
        for key in bigram_keys(&words) {
            if let Some(ids) = self.bigrams.get_mut(&key) {
                ids.remove(&entry.id);
                if ids.is_empty() {
                    self.bigrams.remove(&key);
                }
            }
        }
        for key in trigram_keys(&words) {
            if let Some(ids) = self.trigrams.get_mut(&key) {
                ids.remove(&entry.id);
                if ids.is_empty() {
                    self.trigrams.remove(&key);
                }
            }
        }
    }

    /// Weighted multi-gram search. Returns at most `limit` (id, weight) pairs
    /// sorted by descending weight, id as a stable tiebreak.
    ///
    /// Cost: O(query tokens) hash lookups + O(matches log matches) sort.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        let words = extract_words(query);
        if words.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut trigram_hits: HashSet<&String> = HashSet::new();
        for key in trigram_keys(&words) {
            if let Some(ids) = self.trigrams.get(&key) {
                trigram_hits.extend(ids);
            }
        }

        let mut bigram_hits: HashSet<&String> = HashSet::new();
        for key in bigram_keys(&words) {
            if let Some(ids) = self.bigrams.get(&key) {
                bigram_hits.extend(ids);
            }
        }

        let mut unigram_hits: HashSet<&String> = HashSet::new();
        for word in &words {
            if let Some(ids) = self.unigrams.get(word) {
                unigram_hits.extend(ids);
            }
        }

        let mut matches: Vec<(String, f64)> = Vec::new();
        for id in &trigram_hits {
            matches.push(((*id).clone(), 3.0));
        }
        for id in &bigram_hits {
            if !trigram_hits.contains(*id) {
                matches.push(((*id).clone(), 2.0));
            }
        }
        for id in &unigram_hits {
            if !trigram_hits.contains(*id) && !bigram_hits.contains(*id) {
                matches.push(((*id).clone(), 1.0));
            }
        }

        matches.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        matches.truncate(limit);
        matches
    }

    /// Number of distinct indexed unigram tokens.
    pub fn vocabulary_size(&self) -> usize {
        self.unigrams.len()
    }
}
