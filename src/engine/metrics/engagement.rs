// ── Fieldmind Metrics: Engagement ──────────────────────────────────────────
// Rolling engagement estimate over the last 20 user messages. Three signals:
// how long the messages run, how varied their lengths are, and how often the
// user reaches for ? or !. With no history the tracker answers a neutral 0.5.

use crate::atoms::constants::ENGAGEMENT_WINDOW;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
pub struct EngagementTracker {
    message_lengths: VecDeque<usize>,
    interaction_patterns: HashMap<&'static str, u64>,
}

impl EngagementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_interaction(&mut self, user_input: &str) {
        let length = user_input.chars().count();
        if self.message_lengths.len() == ENGAGEMENT_WINDOW {
            self.message_lengths.pop_front();
        }
        self.message_lengths.push_back(length);

        let bucket = if length > 50 {
            "long_message"
        } else if length < 10 {
            "short_message"
        } else {
            "medium_message"
        };
        *self.interaction_patterns.entry(bucket).or_insert(0) += 1;

        if user_input.contains(['?', '!']) {
            *self.interaction_patterns.entry("emotional").or_insert(0) += 1;
        }
    }

    /// `0.4*length + 0.3*variety + 0.3*emotional`, each component in [0, 1].
    /// Length saturates at 50 chars average; variety at a 20-char standard
    /// deviation; emotional is the fraction of messages carrying ? or !.
    pub fn calculate_engagement(&self) -> f64 {
        if self.message_lengths.is_empty() {
            return 0.5;
        }

        let n = self.message_lengths.len() as f64;
        let avg_length = self.message_lengths.iter().sum::<usize>() as f64 / n;
        let length_score = (avg_length / 50.0).min(1.0);

        let variety_score = if self.message_lengths.len() > 1 {
            let variance = self
                .message_lengths
                .iter()
                .map(|&l| (l as f64 - avg_length).powi(2))
                .sum::<f64>()
                / n;
            (variance.sqrt() / 20.0).min(1.0)
        } else {
            0.5
        };

        let total: u64 = self.interaction_patterns.values().sum();
        let emotional = self
            .interaction_patterns
            .get("emotional")
            .copied()
            .unwrap_or(0) as f64;
        let emotional_ratio = emotional / (total.max(1) as f64);

        (length_score * 0.4 + variety_score * 0.3 + emotional_ratio * 0.3).min(1.0)
    }

    pub fn pattern_count(&self, pattern: &str) -> u64 {
        self.interaction_patterns.get(pattern).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_neutral() {
        assert_eq!(EngagementTracker::new().calculate_engagement(), 0.5);
    }

    #[test]
    fn test_long_excited_messages_beat_terse_ones() {
        let mut excited = EngagementTracker::new();
        excited.track_interaction("Wow, tell me everything about this amazing project of yours!");
        excited.track_interaction("ok");
        excited.track_interaction("And what happened next? I really want to know the details!");

        let mut terse = EngagementTracker::new();
        terse.track_interaction("ok");
        terse.track_interaction("sure");
        terse.track_interaction("fine");

        assert!(excited.calculate_engagement() > terse.calculate_engagement());
    }

    #[test]
    fn test_window_slides() {
        let mut tracker = EngagementTracker::new();
        for _ in 0..30 {
            tracker.track_interaction("a message of medium size here");
        }
        assert_eq!(tracker.message_lengths.len(), ENGAGEMENT_WINDOW);
    }

    #[test]
    fn test_pattern_buckets() {
        let mut tracker = EngagementTracker::new();
        tracker.track_interaction("hi");
        tracker.track_interaction("a medium sized message");
        tracker.track_interaction(&"x".repeat(60));
        tracker.track_interaction("why though?");

        assert_eq!(tracker.pattern_count("short_message"), 1);
        assert_eq!(tracker.pattern_count("long_message"), 1);
        assert_eq!(tracker.pattern_count("medium_message"), 2);
        assert_eq!(tracker.pattern_count("emotional"), 1);
    }

    #[test]
    fn test_engagement_stays_in_unit_range() {
        let mut tracker = EngagementTracker::new();
        for i in 0..20 {
            tracker.track_interaction(&format!("{}!", "word ".repeat(i * 3)));
        }
        let e = tracker.calculate_engagement();
        assert!((0.0..=1.0).contains(&e));
    }
}
