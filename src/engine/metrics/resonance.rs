// ── Fieldmind Metrics: Resonance ───────────────────────────────────────────
//
// Three notions of "resonance" between two texts, all in [0, 1]:
//   semantic  — Jaccard overlap of lowercased token sets
//   emotional — cosine similarity of 3-bucket keyword profiles
//   rhythmic  — blend of message-length and word-length similarity
// Either side being empty scores 0.0.

use crate::atoms::constants::{NEGATIVE_WORDS, NEUTRAL_WORDS, POSITIVE_WORDS};
use crate::engine::tokenizer::whitespace_tokens;
use std::collections::{HashMap, HashSet};

/// Jaccard similarity over token sets.
pub fn semantic_resonance(text1: &str, text2: &str) -> f64 {
    let words1: HashSet<String> = whitespace_tokens(text1).into_iter().collect();
    let words2: HashSet<String> = whitespace_tokens(text2).into_iter().collect();
    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }
    let intersection = words1.intersection(&words2).count() as f64;
    let union = words1.union(&words2).count() as f64;
    intersection / union
}

/// Cosine similarity between the two texts' (positive, negative, neutral)
/// keyword-fraction vectors. Texts with no emotional keywords at all score
/// 0.0 against everything.
pub fn emotional_resonance(text1: &str, text2: &str) -> f64 {
    let profile1 = emotional_profile(text1);
    let profile2 = emotional_profile(text2);

    let dot: f64 = profile1.iter().zip(&profile2).map(|(a, b)| a * b).sum();
    let norm1: f64 = profile1.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm2: f64 = profile2.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm1 * norm2 == 0.0 {
        return 0.0;
    }
    dot / (norm1 * norm2)
}

/// Normalized (positive, negative, neutral) keyword fractions.
fn emotional_profile(text: &str) -> [f64; 3] {
    let mut counts = [0usize; 3];
    for word in whitespace_tokens(text) {
        if POSITIVE_WORDS.contains(&word.as_str()) {
            counts[0] += 1;
        }
        if NEGATIVE_WORDS.contains(&word.as_str()) {
            counts[1] += 1;
        }
        if NEUTRAL_WORDS.contains(&word.as_str()) {
            counts[2] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return [0.0; 3];
    }
    [
        counts[0] as f64 / total as f64,
        counts[1] as f64 / total as f64,
        counts[2] as f64 / total as f64,
    ]
}

/// Structural similarity: half message-length agreement, half average
/// word-length agreement.
pub fn rhythmic_resonance(text1: &str, text2: &str) -> f64 {
    let words1: Vec<&str> = text1.split_whitespace().collect();
    let words2: Vec<&str> = text2.split_whitespace().collect();
    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }

    let len1 = words1.len() as f64;
    let len2 = words2.len() as f64;
    let len_similarity = 1.0 - (len1 - len2).abs() / len1.max(len2);

    let avg1 = words1.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / len1;
    let avg2 = words2.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / len2;
    let word_len_similarity = 1.0 - (avg1 - avg2).abs() / avg1.max(avg2);

    (len_similarity + word_len_similarity) / 2.0
}

/// The most "charged" word in a text: the one maximizing
/// `frequency * (1 / (frequency + 1))` against the supplied history. A word
/// never seen before scores 0; a very common word asymptotes toward 1.
pub fn find_resonant_word(text: &str, word_frequencies: &HashMap<String, u64>) -> (String, f64) {
    let mut best_word = String::new();
    let mut best_score = 0.0;
    for word in whitespace_tokens(text) {
        let frequency = word_frequencies.get(&word).copied().unwrap_or(0) as f64;
        let novelty = 1.0 / (frequency + 1.0);
        let score = frequency * novelty;
        if score > best_score {
            best_score = score;
            best_word = word;
        }
    }
    (best_word, best_score)
}
