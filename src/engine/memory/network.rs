// ── Fieldmind: Associative Network ─────────────────────────────────────────
//
// Weighted undirected concept graph. Concepts are token-level labels; edges
// accumulate strength every time two concepts co-occur in a stored entry or
// a learned conversation, and decay during maintenance.
//
// Symmetry invariant: every mutation touches both directions, so
// weight(a→b) == weight(b→a) at all times. Edges falling below
// ASSOCIATION_PRUNE_FLOOR during decay are removed outright.

use crate::atoms::constants::ASSOCIATION_PRUNE_FLOOR;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AssociativeNetwork {
    edges: HashMap<String, HashMap<String, f64>>,
    /// Cumulative per-concept strength (half the edge strength is credited to
    /// each endpoint on every addition). Used for statistics only.
    concept_strength: HashMap<String, f64>,
}

impl AssociativeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symmetric strength increment between two concepts.
    pub fn add_association(&mut self, concept1: &str, concept2: &str, strength: f64) {
        if concept1 == concept2 {
            return;
        }
        *self
            .edges
            .entry(concept1.to_string())
            .or_default()
            .entry(concept2.to_string())
            .or_insert(0.0) += strength;
        *self
            .edges
            .entry(concept2.to_string())
            .or_default()
            .entry(concept1.to_string())
            .or_insert(0.0) += strength;
        *self.concept_strength.entry(concept1.to_string()).or_insert(0.0) += strength * 0.5;
        *self.concept_strength.entry(concept2.to_string()).or_insert(0.0) += strength * 0.5;
    }

    /// Set an edge to an exact weight (used when loading persisted edges).
    pub fn set_association(&mut self, concept1: &str, concept2: &str, strength: f64) {
        if concept1 == concept2 {
            return;
        }
        self.edges
            .entry(concept1.to_string())
            .or_default()
            .insert(concept2.to_string(), strength);
        self.edges
            .entry(concept2.to_string())
            .or_default()
            .insert(concept1.to_string(), strength);
    }

    /// Neighbors of `concept` sorted by descending strength, truncated to `limit`.
    pub fn get_related_concepts(&self, concept: &str, limit: usize) -> Vec<(String, f64)> {
        let Some(neighbors) = self.edges.get(concept) else {
            return Vec::new();
        };
        let mut related: Vec<(String, f64)> =
            neighbors.iter().map(|(c, w)| (c.clone(), *w)).collect();
        related.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        related.truncate(limit);
        related
    }

    /// Multiplicative reinforcement of an existing edge. No-op if the edge
    /// does not exist.
    pub fn strengthen_association(&mut self, concept1: &str, concept2: &str, factor: f64) {
        let exists = self
            .edges
            .get(concept1)
            .map_or(false, |n| n.contains_key(concept2));
        if !exists {
            return;
        }
        if let Some(w) = self.edges.get_mut(concept1).and_then(|n| n.get_mut(concept2)) {
            *w *= factor;
        }
        if let Some(w) = self.edges.get_mut(concept2).and_then(|n| n.get_mut(concept1)) {
            *w *= factor;
        }
    }

    /// Multiply every edge by `decay_factor` and prune edges that fall below
    /// the floor. Returns the number of pruned directed edges.
    pub fn decay_associations(&mut self, decay_factor: f64) -> usize {
        let mut pruned = 0;
        for neighbors in self.edges.values_mut() {
            neighbors.retain(|_, w| {
                *w *= decay_factor;
                if *w < ASSOCIATION_PRUNE_FLOOR {
                    pruned += 1;
                    false
                } else {
                    true
                }
            });
        }
        self.edges.retain(|_, neighbors| !neighbors.is_empty());
        pruned
    }

    /// Neighbor labels for a word, falling back to the word itself when it
    /// has no edges. Generation-side callers use this for word substitution.
    pub fn semantic_candidates(&self, word: &str, limit: usize) -> Vec<String> {
        let related = self.get_related_concepts(word, limit);
        if related.is_empty() {
            vec![word.to_string()]
        } else {
            related.into_iter().map(|(c, _)| c).collect()
        }
    }

    /// Total number of directed edges (symmetric pairs count twice).
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|n| n.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Snapshot of all directed edges, for persistence. Each symmetric pair
    /// appears once with concept1 < concept2.
    pub fn edge_snapshot(&self) -> Vec<(String, String, f64)> {
        let mut out = Vec::new();
        for (c1, neighbors) in &self.edges {
            for (c2, w) in neighbors {
                if c1 < c2 {
                    out.push((c1.clone(), c2.clone(), *w));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_add() {
        let mut net = AssociativeNetwork::new();
        net.add_association("coffee", "morning", 1.0);
        net.add_association("coffee", "morning", 0.5);

        let from_coffee = net.get_related_concepts("coffee", 5);
        let from_morning = net.get_related_concepts("morning", 5);
        assert_eq!(from_coffee[0], ("morning".into(), 1.5));
        assert_eq!(from_morning[0], ("coffee".into(), 1.5));
    }

    #[test]
    fn test_self_edge_ignored() {
        let mut net = AssociativeNetwork::new();
        net.add_association("echo", "echo", 1.0);
        assert!(net.is_empty());
    }

    #[test]
    fn test_related_sorted_and_limited() {
        let mut net = AssociativeNetwork::new();
        net.add_association("hub", "weak", 0.2);
        net.add_association("hub", "strong", 2.0);
        net.add_association("hub", "mid", 1.0);

        let related = net.get_related_concepts("hub", 2);
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].0, "strong");
        assert_eq!(related[1].0, "mid");
    }

    #[test]
    fn test_strengthen_existing_only() {
        let mut net = AssociativeNetwork::new();
        net.add_association("a", "b", 1.0);
        net.strengthen_association("a", "b", 1.1);
        net.strengthen_association("a", "ghost", 2.0);

        assert!((net.get_related_concepts("a", 5)[0].1 - 1.1).abs() < 1e-9);
        assert_eq!(net.get_related_concepts("ghost", 5).len(), 0);
    }

    #[test]
    fn test_decay_halves_both_directions() {
        let mut net = AssociativeNetwork::new();
        net.add_association("a", "b", 1.0);
        net.decay_associations(0.5);

        assert!((net.get_related_concepts("a", 5)[0].1 - 0.5).abs() < 1e-9);
        assert!((net.get_related_concepts("b", 5)[0].1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_decay_strictly_shrinks_until_prune() {
        let mut net = AssociativeNetwork::new();
        net.add_association("a", "b", 1.0);

        let mut last = 1.0;
        loop {
            net.decay_associations(0.5);
            let related = net.get_related_concepts("a", 5);
            if related.is_empty() {
                break; // pruned below floor
            }
            assert!(related[0].1 < last);
            last = related[0].1;
        }
        assert!(net.is_empty());
    }

    #[test]
    fn test_decay_empty_network_is_noop() {
        let mut net = AssociativeNetwork::new();
        assert_eq!(net.decay_associations(0.5), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn test_semantic_candidates_fallback() {
        let mut net = AssociativeNetwork::new();
        net.add_association("rain", "umbrella", 1.0);

        assert_eq!(net.semantic_candidates("rain", 5), vec!["umbrella"]);
        assert_eq!(net.semantic_candidates("desert", 5), vec!["desert"]);
    }

    #[test]
    fn test_edge_snapshot_one_row_per_pair() {
        let mut net = AssociativeNetwork::new();
        net.add_association("b", "a", 1.0);
        net.add_association("c", "a", 2.0);

        let mut snap = net.edge_snapshot();
        snap.sort_by(|x, y| x.1.cmp(&y.1));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].0, "a");
    }
}
