use crate::tables::ReferenceTables;
use config_engine::{ValidateConfig, Violations};
use logger_redacted::{PhiRedactor, RedactionConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Maximum distance in days between two claims for the same patient
    /// and procedure before they count as duplicates
    pub duplicate_window_days: u32,
    pub cost_coverage_ratio_threshold: f64,
    /// Floor applied to the coverage limit when computing the ratio
    pub ratio_epsilon: f64,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            duplicate_window_days: 1,
            cost_coverage_ratio_threshold: 0.85,
            ratio_epsilon: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub review_threshold: f64,
    pub reject_threshold: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            review_threshold: 0.6,
            reject_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSettings {
    /// Fusion weight per model id; models not listed get `default_weight`
    pub weights: BTreeMap<String, f64>,
    pub default_weight: f64,
    /// Probability substituted for a scorer that fails or times out
    pub fallback_probability: f64,
    pub scorer_timeout_ms: u64,
    /// Consecutive fallbacks after which a scorer is reported unhealthy
    pub degradation_alert_threshold: u64,
}

impl EnsembleSettings {
    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }

    pub fn weight_for(&self, model_id: &str) -> f64 {
        self.weights.get(model_id).copied().unwrap_or(self.default_weight)
    }
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            default_weight: 1.0,
            fallback_probability: 0.5,
            scorer_timeout_ms: 250,
            degradation_alert_threshold: telemetry::DEFAULT_ALERT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingSettings {
    pub trend_days: u32,
    /// Fused score above which a decision counts as fraud-flagged
    pub fraud_flag_threshold: f64,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            trend_days: 7,
            fraud_flag_threshold: 0.5,
        }
    }
}

/// Engine configuration, fixed at process start
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RuleSettings,
    pub policy: PolicySettings,
    pub ensemble: EnsembleSettings,
    pub reporting: ReportingSettings,
    pub tables: ReferenceTables,
    /// PHI scrubbing applied to free text (rule reasons, intake messages)
    /// before it is logged
    pub redaction: RedactionConfig,
    /// Model artifact bundle (YAML or JSON); the built-in models are used
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_path: Option<PathBuf>,
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

impl ValidateConfig for EngineConfig {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut v = Violations::new();

        v.check(self.rules.cost_coverage_ratio_threshold > 0.0, || {
            format!(
                "rules.cost_coverage_ratio_threshold must be positive, got {}",
                self.rules.cost_coverage_ratio_threshold
            )
        });
        v.check(self.rules.ratio_epsilon > 0.0, || {
            format!("rules.ratio_epsilon must be positive, got {}", self.rules.ratio_epsilon)
        });

        let policy = &self.policy;
        v.check(is_probability(policy.review_threshold), || {
            format!("policy.review_threshold must be in [0, 1], got {}", policy.review_threshold)
        });
        v.check(is_probability(policy.reject_threshold), || {
            format!("policy.reject_threshold must be in [0, 1], got {}", policy.reject_threshold)
        });
        v.check(policy.review_threshold <= policy.reject_threshold, || {
            format!(
                "policy.review_threshold ({}) must not exceed policy.reject_threshold ({})",
                policy.review_threshold, policy.reject_threshold
            )
        });

        let ensemble = &self.ensemble;
        v.check(is_probability(ensemble.fallback_probability), || {
            format!(
                "ensemble.fallback_probability must be in [0, 1], got {}",
                ensemble.fallback_probability
            )
        });
        v.check(ensemble.scorer_timeout_ms > 0, || {
            "ensemble.scorer_timeout_ms must be positive".to_string()
        });
        v.check(ensemble.default_weight.is_finite() && ensemble.default_weight >= 0.0, || {
            format!("ensemble.default_weight must be non-negative, got {}", ensemble.default_weight)
        });
        for (model_id, weight) in &ensemble.weights {
            v.check(weight.is_finite() && *weight >= 0.0, || {
                format!("ensemble.weights.{model_id} must be non-negative, got {weight}")
            });
        }

        v.check(self.reporting.trend_days > 0, || {
            "reporting.trend_days must be positive".to_string()
        });
        v.check(is_probability(self.reporting.fraud_flag_threshold), || {
            format!(
                "reporting.fraud_flag_threshold must be in [0, 1], got {}",
                self.reporting.fraud_flag_threshold
            )
        });

        v.extend(self.tables.validate());
        v.extend(
            PhiRedactor::new(&self.redaction)
                .map(|_| ())
                .map_err(|e| vec![format!("redaction: {e}")]),
        );
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.rules.duplicate_window_days, 1);
        assert_eq!(config.ensemble.scorer_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.policy.review_threshold = 0.9;
        config.ensemble.fallback_probability = 1.5;
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("review_threshold"));
    }

    #[test]
    fn bad_redaction_pattern_rejected() {
        let mut config = EngineConfig::default();
        config.redaction.patient_id_pattern = "P(\\d+".into();
        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("redaction:"), "{problems:?}");
    }

    #[test]
    fn weight_lookup_uses_default() {
        let mut settings = EnsembleSettings::default();
        settings.weights.insert("forest".into(), 2.0);
        assert_eq!(settings.weight_for("forest"), 2.0);
        assert_eq!(settings.weight_for("logistic"), 1.0);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: EngineConfig = serde_yaml::from_str("policy:\n  reject_threshold: 0.9\n").unwrap();
        assert_eq!(config.policy.reject_threshold, 0.9);
        assert_eq!(config.policy.review_threshold, 0.6);
        assert_eq!(config.tables, ReferenceTables::default());
    }
}
