// ── Fieldmind Metrics: Perplexity ──────────────────────────────────────────
//
// Perplexity against an additive-smoothed unigram frequency model built from
// the conversation itself. The model is non-stationary on purpose: callers
// score a text against the frequencies seen so far and only then feed the
// text into the model, so the same sentence scores differently as the
// conversation evolves. Bigram counts are maintained alongside for resonance
// lookups.

use crate::atoms::constants::PERPLEXITY_CAP;
use crate::engine::tokenizer::whitespace_tokens;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PerplexityMeter {
    word_frequencies: HashMap<String, u64>,
    bigram_frequencies: HashMap<(String, String), u64>,
    total_words: u64,
}

impl PerplexityMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text into the frequency model.
    pub fn update_frequencies(&mut self, text: &str) {
        let words = whitespace_tokens(text);
        for word in &words {
            *self.word_frequencies.entry(word.clone()).or_insert(0) += 1;
            self.total_words += 1;
        }
        for pair in words.windows(2) {
            *self
                .bigram_frequencies
                .entry((pair[0].clone(), pair[1].clone()))
                .or_insert(0) += 1;
        }
    }

    /// Perplexity of `text` under the current model, capped at 100. An empty
    /// text or an empty model scores 1.0 (perfectly predictable).
    ///
    /// Unseen words get a pseudo-count of 1 (additive smoothing), so novel
    /// vocabulary raises the score instead of blowing it up to infinity.
    pub fn calculate_perplexity(&self, text: &str) -> f64 {
        let words = whitespace_tokens(text);
        if words.is_empty() || self.total_words == 0 {
            return 1.0;
        }

        let denominator = (self.total_words + self.word_frequencies.len() as u64) as f64;
        let log_probability: f64 = words
            .iter()
            .map(|word| {
                let freq = self.word_frequencies.get(word).copied().unwrap_or(1);
                (freq as f64 / denominator).log2()
            })
            .sum();

        let avg_log_prob = log_probability / words.len() as f64;
        let perplexity = 2f64.powf(-avg_log_prob);
        perplexity.min(PERPLEXITY_CAP)
    }

    pub fn word_frequencies(&self) -> &HashMap<String, u64> {
        &self.word_frequencies
    }

    pub fn bigram_count(&self, first: &str, second: &str) -> u64 {
        self.bigram_frequencies
            .get(&(first.to_lowercase(), second.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model_and_empty_text_score_one() {
        let meter = PerplexityMeter::new();
        assert_eq!(meter.calculate_perplexity("anything at all"), 1.0);

        let mut meter = PerplexityMeter::new();
        meter.update_frequencies("some corpus text");
        assert_eq!(meter.calculate_perplexity(""), 1.0);
    }

    #[test]
    fn test_familiar_text_scores_lower_than_novel() {
        let mut meter = PerplexityMeter::new();
        meter.update_frequencies("the cat sat on the mat");
        meter.update_frequencies("the cat slept on the mat");

        let familiar = meter.calculate_perplexity("the cat");
        let novel = meter.calculate_perplexity("quantum chromodynamics lecture");
        assert!(familiar < novel);
    }

    #[test]
    fn test_perplexity_is_capped() {
        let mut meter = PerplexityMeter::new();
        meter.update_frequencies("tiny corpus");
        // A long fully-novel text pushes toward the ceiling.
        let long_novel = "w1 w2 w3 w4 w5 w6 w7 w8 w9 w10".repeat(5);
        assert!(meter.calculate_perplexity(&long_novel) <= 100.0);
    }

    #[test]
    fn test_non_stationary_scoring() {
        let mut meter = PerplexityMeter::new();
        meter.update_frequencies("hello world");
        let before = meter.calculate_perplexity("hello world again");
        meter.update_frequencies("hello world again");
        meter.update_frequencies("hello world again");
        let after = meter.calculate_perplexity("hello world again");
        assert!(after < before);
    }

    #[test]
    fn test_bigram_counts_tracked() {
        let mut meter = PerplexityMeter::new();
        meter.update_frequencies("deep blue sea");
        meter.update_frequencies("Deep Blue machine");
        assert_eq!(meter.bigram_count("deep", "blue"), 2);
        assert_eq!(meter.bigram_count("blue", "deep"), 0);
    }
}
