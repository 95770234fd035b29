// ── Fieldmind Metrics: Entropy ─────────────────────────────────────────────
// Shannon entropy in bits, at character and word granularity. All empty
// inputs yield 0.0.

use crate::engine::tokenizer::whitespace_tokens;
use std::collections::HashMap;

/// Character-level Shannon entropy of the lowercased text.
pub fn char_entropy(text: &str) -> f64 {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    distribution_entropy(chars.iter())
}

/// Word-level Shannon entropy. Repeated tokens lower the value; a text of
/// all-distinct tokens maximizes it at log2(n).
pub fn word_entropy(text: &str) -> f64 {
    let words = whitespace_tokens(text);
    distribution_entropy(words.iter())
}

/// Word entropy over a whole conversation, treated as one concatenated text.
pub fn conversation_entropy(messages: &[String]) -> f64 {
    if messages.is_empty() {
        return 0.0;
    }
    word_entropy(&messages.join(" "))
}

fn distribution_entropy<T: std::hash::Hash + Eq>(items: impl Iterator<Item = T>) -> f64 {
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut total = 0usize;
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}
