use ::metrics::{counter, histogram};
use std::time::Duration;

pub const DECISIONS_TOTAL: &str = "claimguard_decisions_total";
pub const RULE_FAILURES_TOTAL: &str = "claimguard_rule_failures_total";
pub const SCORER_DEGRADED_TOTAL: &str = "claimguard_scorer_degraded_total";
pub const PIPELINE_LATENCY_SECONDS: &str = "claimguard_pipeline_latency_seconds";
pub const FUSED_SCORE: &str = "claimguard_fused_score";
pub const INTAKE_REJECTED_TOTAL: &str = "claimguard_intake_rejected_total";

/// Facade over the `metrics` macros
///
/// Emits into whatever recorder the host process installed; with no
/// recorder every call is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMetrics;

impl EngineMetrics {
    pub fn new() -> Self {
        Self
    }

    pub fn record_decision(&self, disposition: &'static str, fused_score: f64, latency: Duration) {
        counter!(DECISIONS_TOTAL, "disposition" => disposition).increment(1);
        histogram!(FUSED_SCORE).record(fused_score);
        histogram!(PIPELINE_LATENCY_SECONDS).record(latency.as_secs_f64());
    }

    pub fn record_rule_failure(&self, rule: &'static str, severity: &'static str) {
        counter!(RULE_FAILURES_TOTAL, "rule" => rule, "severity" => severity).increment(1);
    }

    pub fn record_degradation(&self, model_id: &str, reason: &'static str) {
        counter!(SCORER_DEGRADED_TOTAL, "model" => model_id.to_string(), "reason" => reason).increment(1);
    }

    pub fn record_intake_rejection(&self, field_count: usize) {
        counter!(INTAKE_REJECTED_TOTAL).increment(1);
        tracing::debug!(field_count, "claim rejected at intake");
    }
}
