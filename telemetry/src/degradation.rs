use dashmap::DashMap;
use serde::Serialize;
use tracing::warn;

/// Consecutive fallbacks after which a scorer is reported as unhealthy
pub const DEFAULT_ALERT_THRESHOLD: u64 = 5;

#[derive(Debug, Clone, Default)]
struct ScorerHealth {
    consecutive: u64,
    total_degraded: u64,
    total_healthy: u64,
    last_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorerHealthSnapshot {
    pub model_id: String,
    pub consecutive_degraded: u64,
    pub total_degraded: u64,
    pub total_healthy: u64,
    pub last_reason: Option<String>,
}

/// Tracks scorer fallbacks across requests
///
/// A single fallback is routine; a run of them means a model artifact or
/// dependency is broken. The tracker warns when a scorer's run of
/// consecutive fallbacks reaches the threshold, and again at every
/// multiple of it.
#[derive(Debug)]
pub struct DegradationTracker {
    scorers: DashMap<String, ScorerHealth>,
    alert_threshold: u64,
}

impl Default for DegradationTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl DegradationTracker {
    pub fn new(alert_threshold: u64) -> Self {
        Self {
            scorers: DashMap::new(),
            alert_threshold: alert_threshold.max(1),
        }
    }

    /// Returns the scorer's current run of consecutive fallbacks
    pub fn record_degraded(&self, model_id: &str, reason: &str) -> u64 {
        let mut health = self.scorers.entry(model_id.to_string()).or_default();
        health.consecutive += 1;
        health.total_degraded += 1;
        health.last_reason = Some(reason.to_string());

        let run = health.consecutive;
        if run % self.alert_threshold == 0 {
            warn!(
                model_id,
                consecutive = run,
                total = health.total_degraded,
                reason,
                "scorer repeatedly degraded to fallback probability"
            );
        }
        run
    }

    pub fn record_healthy(&self, model_id: &str) {
        let mut health = self.scorers.entry(model_id.to_string()).or_default();
        health.consecutive = 0;
        health.total_healthy += 1;
    }

    pub fn consecutive_degraded(&self, model_id: &str) -> u64 {
        self.scorers.get(model_id).map_or(0, |h| h.consecutive)
    }

    /// Per-scorer health, sorted by model id
    pub fn snapshot(&self) -> Vec<ScorerHealthSnapshot> {
        let mut out: Vec<ScorerHealthSnapshot> = self
            .scorers
            .iter()
            .map(|entry| ScorerHealthSnapshot {
                model_id: entry.key().clone(),
                consecutive_degraded: entry.consecutive,
                total_degraded: entry.total_degraded,
                total_healthy: entry.total_healthy,
                last_reason: entry.last_reason.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_score_resets_run() {
        let tracker = DegradationTracker::new(3);
        assert_eq!(tracker.record_degraded("forest", "timeout"), 1);
        assert_eq!(tracker.record_degraded("forest", "timeout"), 2);
        tracker.record_healthy("forest");
        assert_eq!(tracker.consecutive_degraded("forest"), 0);
        assert_eq!(tracker.record_degraded("forest", "nan"), 1);

        let snap = tracker.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].total_degraded, 3);
        assert_eq!(snap[0].total_healthy, 1);
        assert_eq!(snap[0].last_reason.as_deref(), Some("nan"));
    }

    #[test]
    fn snapshot_sorted_by_model() {
        let tracker = DegradationTracker::default();
        tracker.record_healthy("logistic");
        tracker.record_degraded("anomaly", "timeout");
        let ids: Vec<_> = tracker.snapshot().into_iter().map(|s| s.model_id).collect();
        assert_eq!(ids, vec!["anomaly", "logistic"]);
    }

    #[test]
    fn unknown_model_has_no_run() {
        assert_eq!(DegradationTracker::default().consecutive_degraded("missing"), 0);
    }
}
