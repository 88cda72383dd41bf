use crate::config::{EngineConfig, ReportingSettings};
use crate::ensemble::{Degradation, ModelEnsemble};
use crate::error::{ClaimsError, ClaimsResult};
use crate::explain::{explain, DecisionExplanation};
use crate::features::FeatureSpec;
use crate::fusion::{fuse, FusionWeights};
use crate::history::{HistoryIndex, HistoryMode};
use crate::intake::ClaimSubmission;
use crate::models::{ClaimRecord, DecisionRecord};
use crate::policy::DecisionPolicy;
use crate::reporting::SummaryWindow;
use crate::rules::RuleEvaluator;
use crate::scoring::ModelArtifacts;
use audit_engine::{AuditEventType, AuditTrail};
use chrono::NaiveDate;
use config_engine::{ConfigError, ValidateConfig};
use error_common::{log_error, ClaimGuardError, ErrorContext};
use logger_redacted::{patient_token, redacted_warn, PhiRedactor};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{DegradationTracker, EngineMetrics};
use tracing::{debug, info, info_span, Instrument};

/// Claim validation pipeline
///
/// Rules and scorers run concurrently; the policy waits for both. Each
/// validation runs in its own task, so a caller that stops waiting does
/// not stop the decision from being recorded.
#[derive(Clone)]
pub struct ClaimValidationService {
    rules: Arc<RuleEvaluator>,
    features: Arc<FeatureSpec>,
    ensemble: Arc<ModelEnsemble>,
    weights: Arc<FusionWeights>,
    policy: DecisionPolicy,
    history: Arc<HistoryIndex>,
    audit: Arc<AuditTrail>,
    degradation: Arc<DegradationTracker>,
    metrics: EngineMetrics,
    model_version: Arc<str>,
    reporting: ReportingSettings,
    redactor: Arc<PhiRedactor>,
}

impl ClaimValidationService {
    /// Build from configuration, loading model artifacts when a path is set
    pub fn new(config: EngineConfig) -> ClaimsResult<Self> {
        config
            .validate()
            .map_err(|problems| ClaimsError::ConfigLoad(ConfigError::ValidationError(problems)))?;
        let artifacts = match &config.artifacts_path {
            Some(path) => ModelArtifacts::from_file(path)?,
            None => ModelArtifacts::builtin(),
        };
        Self::with_artifacts(config, artifacts)
    }

    pub fn with_artifacts(config: EngineConfig, artifacts: ModelArtifacts) -> ClaimsResult<Self> {
        artifacts.validate().map_err(ClaimsError::Config)?;
        let ensemble = ModelEnsemble::from_artifacts(&artifacts, &config.ensemble)?;
        let redactor =
            PhiRedactor::new(&config.redaction).map_err(|e| ClaimsError::Config(e.to_string()))?;

        info!(
            model_version = %artifacts.version,
            feature_version = %artifacts.features.version,
            models = ?ensemble.model_ids(),
            "claim validation service initialised"
        );

        Ok(Self {
            rules: Arc::new(RuleEvaluator::new(config.rules.clone(), &config.tables)),
            features: Arc::new(artifacts.features),
            weights: Arc::new(ensemble.fusion_weights()),
            ensemble: Arc::new(ensemble),
            policy: DecisionPolicy::new(&config.policy),
            history: Arc::new(HistoryIndex::new()),
            audit: Arc::new(AuditTrail::new()),
            degradation: Arc::new(DegradationTracker::new(config.ensemble.degradation_alert_threshold)),
            metrics: EngineMetrics::new(),
            model_version: Arc::from(artifacts.version),
            reporting: config.reporting,
            redactor: Arc::new(redactor),
        })
    }

    /// Replace the scorers, e.g. with remote or instrumented implementations
    pub fn with_ensemble(mut self, ensemble: ModelEnsemble) -> Self {
        self.weights = Arc::new(ensemble.fusion_weights());
        self.ensemble = Arc::new(ensemble);
        self
    }

    /// Share a history index with other service instances
    pub fn with_history(mut self, history: Arc<HistoryIndex>) -> Self {
        self.history = history;
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditTrail>) -> Self {
        self.audit = audit;
        self
    }

    pub fn history(&self) -> &HistoryIndex {
        &self.history
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn degradation(&self) -> &DegradationTracker {
        &self.degradation
    }

    /// Redactor for free text that may carry PHI
    pub fn redactor(&self) -> &PhiRedactor {
        &self.redactor
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Validate a claim and record it in the history index
    pub async fn validate(&self, claim: ClaimRecord) -> ClaimsResult<DecisionRecord> {
        self.validate_with_mode(claim, HistoryMode::Record).await
    }

    /// Validate a claim; [`HistoryMode::DryRun`] leaves history and the
    /// audit trail untouched
    pub async fn validate_with_mode(
        &self,
        claim: ClaimRecord,
        mode: HistoryMode,
    ) -> ClaimsResult<DecisionRecord> {
        let engine = self.clone();
        tokio::spawn(async move { engine.run(claim, mode).await })
            .await
            .map_err(|e| ClaimsError::TaskFailed(e.to_string()))
    }

    /// Intake-validate a raw submission, then validate the resulting claim
    pub async fn submit(&self, submission: ClaimSubmission) -> ClaimsResult<DecisionRecord> {
        self.submit_with_mode(submission, HistoryMode::Record).await
    }

    pub async fn submit_with_mode(
        &self,
        submission: ClaimSubmission,
        mode: HistoryMode,
    ) -> ClaimsResult<DecisionRecord> {
        let patient = patient_token(submission.patient_id.trim());
        match submission.into_record() {
            Ok(claim) => self.validate_with_mode(claim, mode).await,
            Err(ClaimsError::Intake(violations)) => {
                self.metrics.record_intake_rejection(violations.len());
                let err = ClaimsError::Intake(violations);
                redacted_warn!(self.redactor, "submission from {patient}: {err}");
                Err(err)
            }
            Err(other) => Err(other),
        }
    }

    /// Validate claims one after another, in the order given
    pub async fn validate_batch(&self, claims: Vec<ClaimRecord>) -> Vec<ClaimsResult<DecisionRecord>> {
        let mut results = Vec::with_capacity(claims.len());
        for claim in claims {
            results.push(self.validate(claim).await);
        }
        results
    }

    pub fn explain(&self, record: &DecisionRecord) -> DecisionExplanation {
        explain(record)
    }

    /// Summary window ending at `as_of` using the configured reporting settings
    pub fn summary_window(&self, as_of: NaiveDate) -> SummaryWindow {
        SummaryWindow {
            as_of,
            trend_days: self.reporting.trend_days,
            fraud_flag_threshold: self.reporting.fraud_flag_threshold,
        }
    }

    async fn run(&self, claim: ClaimRecord, mode: HistoryMode) -> DecisionRecord {
        let span = info_span!(
            "validate_claim",
            claim_id = %claim.claim_id,
            patient = %patient_token(&claim.patient_id),
            ?mode
        );
        async move {
            let started = Instant::now();
            let features = self.features.transform(&claim);

            let (outcomes, scoring) = tokio::join!(
                async { self.rules.evaluate(&claim, &self.history, mode) },
                self.ensemble.score(&features),
            );

            let fused = fuse(&scoring.scores, &self.weights);
            let disposition = self.policy.decide(&outcomes, fused);
            let record = DecisionRecord::new(
                &claim,
                disposition,
                fused,
                outcomes,
                scoring.scores,
                self.model_version.to_string(),
            );

            self.observe(&record, &scoring.degradations, mode, started.elapsed());
            record
        }
        .instrument(span)
        .await
    }

    fn observe(
        &self,
        record: &DecisionRecord,
        degradations: &[Degradation],
        mode: HistoryMode,
        latency: Duration,
    ) {
        let disposition = record.disposition();
        self.metrics
            .record_decision(disposition.as_str(), record.fused_score().value(), latency);
        for outcome in record.failed_rules() {
            self.metrics
                .record_rule_failure(outcome.rule.as_str(), outcome.severity.as_str());
            debug!(
                rule = outcome.rule.as_str(),
                severity = outcome.severity.as_str(),
                reason = %self.redactor.redact(&outcome.reason),
                "rule failed"
            );
        }

        for score in record.model_scores().iter().filter(|s| !s.is_fallback()) {
            self.degradation.record_healthy(&score.model_id);
        }
        for degraded in degradations {
            let reason = degraded.error.reason();
            self.degradation.record_degraded(&degraded.model_id, reason);
            self.metrics.record_degradation(&degraded.model_id, reason);
            if mode == HistoryMode::Record {
                self.audit.append(
                    AuditEventType::ScorerDegraded,
                    record.claim_id(),
                    reason,
                    json!({
                        "model_id": degraded.model_id,
                        "error": degraded.error.to_string(),
                        "model_version": record.model_version(),
                    }),
                );
            }
        }

        if mode == HistoryMode::Record {
            for outcome in record.failed_rules().filter(|o| o.is_critical_failure()) {
                if let Some(violation) = outcome.violation {
                    self.audit.append(
                        AuditEventType::AnomalyDetected,
                        record.claim_id(),
                        violation.anomaly_type(),
                        json!({
                            "rule": outcome.rule.as_str(),
                            "code": violation.as_str(),
                            "reason": outcome.reason,
                        }),
                    );
                }
            }
            if let Err(error) = self.audit.record(
                AuditEventType::DecisionRecorded,
                record.claim_id(),
                disposition.as_str(),
                record,
            ) {
                let context = ErrorContext::new()
                    .with_claim_id(record.claim_id())
                    .with_operation("audit_decision");
                log_error(&context, &ClaimGuardError::from(error));
            }
        }

        info!(
            disposition = disposition.as_str(),
            fused_score = record.fused_score().value(),
            critical = record.triggered_critical().len(),
            degraded = degradations.len(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "claim validated"
        );
    }
}

impl std::fmt::Debug for ClaimValidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimValidationService")
            .field("model_version", &self.model_version)
            .field("ensemble", &self.ensemble)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}
