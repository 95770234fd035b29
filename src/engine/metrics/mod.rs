// ── Fieldmind: Metrics Suite ───────────────────────────────────────────────
//
// Text-quality analytics over live conversations, no model weights anywhere.
// MetricsCore glues the individual calculators together: each analyzed turn
// becomes an immutable MetricSnapshot appended to a bounded global history
// and a per-session list.
//
// Ordering invariant: perplexity is scored against the frequencies seen
// BEFORE the current turn, then the turn is folded into the model. Swapping
// those steps would make every turn look artificially familiar.

pub mod coherence;
pub mod engagement;
pub mod entropy;
pub mod perplexity;
pub mod resonance;

use crate::atoms::constants::{COHERENCE_WINDOW, METRIC_HISTORY_CAP};
use crate::atoms::types::{MetricAnomaly, MetricSnapshot};
use engagement::EngagementTracker;
use log::debug;
use perplexity::PerplexityMeter;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

const METRIC_NAMES: [&str; 5] = [
    "entropy",
    "perplexity",
    "resonance",
    "coherence",
    "engagement",
];

fn metric_value(snapshot: &MetricSnapshot, name: &str) -> f64 {
    match name {
        "entropy" => snapshot.entropy,
        "perplexity" => snapshot.perplexity,
        "resonance" => snapshot.resonance,
        "coherence" => snapshot.coherence,
        "engagement" => snapshot.engagement,
        _ => 0.0,
    }
}

/// Per-metric evolution and summary for one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionAnalytics {
    /// metric name -> value per turn, in turn order.
    pub evolution: HashMap<String, Vec<f64>>,
    pub transformers_used: Vec<String>,
    pub transformer_changes: usize,
    pub session_duration: f64,
    pub total_interactions: usize,
    /// `0.4*resonance + 0.3*coherence + 0.3*engagement` of the final turn.
    pub session_score: f64,
}

/// Aggregate view of one transformer's metric history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformerPerformance {
    pub avg_metrics: HashMap<String, f64>,
    /// Relative first-half vs second-half drift per metric
    /// (`(second - first) / first`, 0 when the first half averaged 0).
    pub trends: HashMap<String, f64>,
    pub performance_score: f64,
    pub total_interactions: usize,
    pub lifespan_secs: f64,
}

pub struct MetricsCore {
    perplexity_meter: PerplexityMeter,
    engagement_tracker: EngagementTracker,
    metric_history: VecDeque<MetricSnapshot>,
    session_metrics: HashMap<String, Vec<MetricSnapshot>>,
    session_messages: HashMap<String, Vec<String>>,
}

impl Default for MetricsCore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCore {
    pub fn new() -> Self {
        Self {
            perplexity_meter: PerplexityMeter::new(),
            engagement_tracker: EngagementTracker::new(),
            metric_history: VecDeque::with_capacity(METRIC_HISTORY_CAP),
            session_metrics: HashMap::new(),
            session_messages: HashMap::new(),
        }
    }

    /// Analyze one exchange and record its snapshot.
    pub fn analyze_conversation_turn(
        &mut self,
        user_input: &str,
        agent_output: &str,
        transformer_id: &str,
        session_id: &str,
    ) -> MetricSnapshot {
        let entropy = entropy::word_entropy(&format!("{} {}", user_input, agent_output));
        // Score against the pre-turn model, then update it.
        let perplexity = self.perplexity_meter.calculate_perplexity(agent_output);
        self.perplexity_meter.update_frequencies(user_input);
        self.perplexity_meter.update_frequencies(agent_output);

        let resonance = resonance::semantic_resonance(user_input, agent_output);

        self.engagement_tracker.track_interaction(user_input);
        let engagement = self.engagement_tracker.calculate_engagement();

        let messages = self.session_messages.entry(session_id.to_string()).or_default();
        messages.push(user_input.to_string());
        messages.push(agent_output.to_string());
        let window_start = messages.len().saturating_sub(COHERENCE_WINDOW);
        let coherence = coherence::local_coherence(&messages[window_start..]);

        let snapshot = MetricSnapshot {
            timestamp: chrono::Utc::now().timestamp_micros() as f64 / 1e6,
            entropy,
            perplexity,
            resonance,
            coherence,
            engagement,
            transformer_id: transformer_id.to_string(),
            session_id: session_id.to_string(),
        };
        debug!(
            "[metrics] Turn analyzed: entropy {:.2}, perplexity {:.2}, resonance {:.2}",
            entropy, perplexity, resonance
        );

        if self.metric_history.len() == METRIC_HISTORY_CAP {
            self.metric_history.pop_front();
        }
        self.metric_history.push_back(snapshot.clone());
        self.session_metrics
            .entry(session_id.to_string())
            .or_default()
            .push(snapshot.clone());
        snapshot
    }

    /// Flag metric points in the last `recent_count` snapshots that sit more
    /// than two standard deviations from the window mean. Noise guard: a
    /// metric whose deviation is below 0.1 never produces anomalies. Returns
    /// nothing until the history holds at least `recent_count` snapshots.
    pub fn detect_anomalies(&self, recent_count: usize) -> Vec<MetricAnomaly> {
        if self.metric_history.len() < recent_count {
            return Vec::new();
        }
        let recent: Vec<&MetricSnapshot> = self
            .metric_history
            .iter()
            .skip(self.metric_history.len() - recent_count)
            .collect();

        let mut anomalies = Vec::new();
        for name in METRIC_NAMES {
            let values: Vec<f64> = recent.iter().map(|m| metric_value(m, name)).collect();
            if values.len() < 3 {
                continue;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
            let std_dev = variance.sqrt();
            if std_dev <= 0.1 {
                continue;
            }
            for (i, &value) in values.iter().enumerate() {
                if (value - mean).abs() > 2.0 * std_dev {
                    anomalies.push(MetricAnomaly {
                        metric: name,
                        value,
                        expected_low: mean - 2.0 * std_dev,
                        expected_high: mean + 2.0 * std_dev,
                        timestamp: recent[i].timestamp,
                        transformer_id: recent[i].transformer_id.clone(),
                    });
                }
            }
        }
        anomalies
    }

    /// Metric evolution and summary score for one session. Unknown session
    /// ids yield the default (empty) analytics.
    pub fn session_analytics(&self, session_id: &str) -> SessionAnalytics {
        let Some(snapshots) = self.session_metrics.get(session_id) else {
            return SessionAnalytics::default();
        };
        if snapshots.is_empty() {
            return SessionAnalytics::default();
        }

        let mut evolution: HashMap<String, Vec<f64>> = HashMap::new();
        for name in METRIC_NAMES {
            evolution.insert(
                name.to_string(),
                snapshots.iter().map(|m| metric_value(m, name)).collect(),
            );
        }

        let mut transformers: Vec<String> =
            snapshots.iter().map(|m| m.transformer_id.clone()).collect();
        transformers.sort();
        transformers.dedup();

        let last = &snapshots[snapshots.len() - 1];
        let session_score = last.resonance * 0.4 + last.coherence * 0.3 + last.engagement * 0.3;
        let session_duration = if snapshots.len() > 1 {
            last.timestamp - snapshots[0].timestamp
        } else {
            0.0
        };

        SessionAnalytics {
            evolution,
            transformer_changes: transformers.len(),
            transformers_used: transformers,
            session_duration,
            total_interactions: snapshots.len(),
            session_score,
        }
    }

    /// Averages, drift and a composite score for everything one transformer
    /// produced. Unknown transformers yield the default (empty) report.
    pub fn transformer_performance(&self, transformer_id: &str) -> TransformerPerformance {
        let snapshots: Vec<&MetricSnapshot> = self
            .metric_history
            .iter()
            .filter(|m| m.transformer_id == transformer_id)
            .collect();
        if snapshots.is_empty() {
            return TransformerPerformance::default();
        }

        let n = snapshots.len() as f64;
        let mut avg_metrics = HashMap::new();
        for name in METRIC_NAMES {
            let sum: f64 = snapshots.iter().map(|m| metric_value(m, name)).sum();
            avg_metrics.insert(name.to_string(), sum / n);
        }

        let mut trends = HashMap::new();
        if snapshots.len() > 1 {
            let mid = snapshots.len() / 2;
            for name in METRIC_NAMES {
                let first: f64 = snapshots[..mid]
                    .iter()
                    .map(|m| metric_value(m, name))
                    .sum::<f64>()
                    / mid as f64;
                let second: f64 = snapshots[mid..]
                    .iter()
                    .map(|m| metric_value(m, name))
                    .sum::<f64>()
                    / (snapshots.len() - mid) as f64;
                let trend = if first > 0.0 { (second - first) / first } else { 0.0 };
                trends.insert(format!("{}_trend", name), trend);
            }
        }

        let performance_score = avg_metrics["resonance"] * 0.3
            + avg_metrics["coherence"] * 0.25
            + avg_metrics["engagement"] * 0.25
            + (1.0 / avg_metrics["perplexity"].max(0.1)) * 0.1
            + (avg_metrics["entropy"] / 3.0).min(1.0) * 0.1;

        TransformerPerformance {
            avg_metrics,
            trends,
            performance_score,
            total_interactions: snapshots.len(),
            lifespan_secs: snapshots[snapshots.len() - 1].timestamp - snapshots[0].timestamp,
        }
    }

    pub fn history_len(&self) -> usize {
        self.metric_history.len()
    }

    pub fn word_frequencies(&self) -> &HashMap<String, u64> {
        self.perplexity_meter.word_frequencies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_snapshot_fields_populated() {
        let mut core = MetricsCore::new();
        let snapshot = core.analyze_conversation_turn(
            "tell me about the garden",
            "the garden is blooming nicely",
            "t1",
            "s1",
        );
        assert!(snapshot.entropy > 0.0);
        assert!(snapshot.perplexity >= 1.0);
        assert!(snapshot.resonance > 0.0); // shares "the garden"
        assert_eq!(snapshot.transformer_id, "t1");
        assert_eq!(core.history_len(), 1);
    }

    #[test]
    fn test_first_turn_perplexity_is_one() {
        // The model is empty before the first turn, so the first agent output
        // must be scored as perfectly predictable.
        let mut core = MetricsCore::new();
        let snapshot = core.analyze_conversation_turn("hi", "hello there", "t1", "s1");
        assert_eq!(snapshot.perplexity, 1.0);
    }

    #[test]
    fn test_anomaly_detection_needs_full_window() {
        let mut core = MetricsCore::new();
        for _ in 0..5 {
            core.analyze_conversation_turn("steady input here", "steady output here", "t1", "s1");
        }
        assert!(core.detect_anomalies(10).is_empty());
    }

    #[test]
    fn test_anomaly_detected_on_spike() {
        let mut core = MetricsCore::new();
        // Nine near-identical low-entropy turns, then one wildly different.
        for _ in 0..9 {
            core.analyze_conversation_turn("same same", "same same", "t1", "s1");
        }
        core.analyze_conversation_turn(
            "suddenly completely different vocabulary appears everywhere today",
            "indeed the lexical character shifted dramatically this instant",
            "t1",
            "s1",
        );
        let anomalies = core.detect_anomalies(10);
        assert!(anomalies.iter().any(|a| a.metric == "entropy"));
        for a in &anomalies {
            assert!(a.value < a.expected_low || a.value > a.expected_high);
        }
    }

    #[test]
    fn test_session_analytics_summary() {
        let mut core = MetricsCore::new();
        core.analyze_conversation_turn("hello there", "hello friend", "t1", "s1");
        core.analyze_conversation_turn("how are you", "doing well", "t2", "s1");

        let analytics = core.session_analytics("s1");
        assert_eq!(analytics.total_interactions, 2);
        assert_eq!(analytics.transformer_changes, 2);
        assert_eq!(analytics.evolution["entropy"].len(), 2);
        assert!(analytics.session_score >= 0.0);

        assert_eq!(core.session_analytics("missing").total_interactions, 0);
    }

    #[test]
    fn test_transformer_performance_report() {
        let mut core = MetricsCore::new();
        for i in 0..4 {
            core.analyze_conversation_turn(
                &format!("message number {} about gardens", i),
                "gardens are a fine topic",
                "worker",
                "s1",
            );
        }
        let report = core.transformer_performance("worker");
        assert_eq!(report.total_interactions, 4);
        assert!(report.avg_metrics.contains_key("resonance"));
        assert!(report.trends.contains_key("entropy_trend"));
        assert!(report.performance_score > 0.0);

        assert_eq!(core.transformer_performance("nobody").total_interactions, 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut core = MetricsCore::new();
        for i in 0..(METRIC_HISTORY_CAP + 10) {
            core.analyze_conversation_turn(&format!("m{}", i), "r", "t1", "s1");
        }
        assert_eq!(core.history_len(), METRIC_HISTORY_CAP);
    }
}
