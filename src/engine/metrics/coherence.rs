// ── Fieldmind Metrics: Coherence ───────────────────────────────────────────
// How well a conversation hangs together. Local coherence looks only at
// consecutive messages; global coherence weighs all pairs, discounted by how
// sparsely connected the conversation graph is. Fewer than two messages is
// trivially coherent (1.0).

use crate::atoms::constants::COHERENCE_LINK_THRESHOLD;
use crate::engine::metrics::resonance::semantic_resonance;

/// Mean semantic resonance between consecutive messages.
pub fn local_coherence(messages: &[String]) -> f64 {
    if messages.len() < 2 {
        return 1.0;
    }
    let scores: Vec<f64> = messages
        .windows(2)
        .map(|pair| semantic_resonance(&pair[0], &pair[1]))
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// All-pairs coherence: mean strength of pairs above the link threshold,
/// multiplied by the fraction of possible pairs that are linked at all. A
/// conversation where only neighbors relate scores lower than one whose
/// every message shares vocabulary.
pub fn global_coherence(messages: &[String]) -> f64 {
    let n = messages.len();
    if n < 2 {
        return 1.0;
    }

    let mut connections = 0usize;
    let mut total_strength = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let resonance = semantic_resonance(&messages[i], &messages[j]);
            if resonance > COHERENCE_LINK_THRESHOLD {
                connections += 1;
                total_strength += resonance;
            }
        }
    }
    if connections == 0 {
        return 0.0;
    }
    let avg_strength = total_strength / connections as f64;
    let density = connections as f64 / (n * (n - 1) / 2) as f64;
    avg_strength * density
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msgs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_short_conversations_are_trivially_coherent() {
        assert_eq!(local_coherence(&[]), 1.0);
        assert_eq!(local_coherence(&msgs(&["only one"])), 1.0);
        assert_eq!(global_coherence(&msgs(&["only one"])), 1.0);
    }

    #[test]
    fn test_on_topic_beats_topic_hopping() {
        let focused = msgs(&[
            "the garden needs water",
            "water the garden tomorrow",
            "garden water schedule",
        ]);
        let scattered = msgs(&[
            "the garden needs water",
            "stock prices dropped",
            "my cat sneezed",
        ]);
        assert!(local_coherence(&focused) > local_coherence(&scattered));
        assert!(global_coherence(&focused) > global_coherence(&scattered));
    }

    #[test]
    fn test_fully_unrelated_global_is_zero() {
        let scattered = msgs(&["alpha beta", "gamma delta", "epsilon zeta"]);
        assert_eq!(global_coherence(&scattered), 0.0);
    }

    #[test]
    fn test_identical_messages_fully_coherent() {
        let same = msgs(&["same thing here", "same thing here", "same thing here"]);
        assert!((local_coherence(&same) - 1.0).abs() < 1e-9);
        assert!((global_coherence(&same) - 1.0).abs() < 1e-9);
    }
}
