use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Patient gender as recorded on the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    Other,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Other => "Other",
        }
    }

    /// Accepts `M`/`F`/`Other` and the spelled-out forms, case-insensitively
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Self::Male),
            "f" | "female" => Some(Self::Female),
            "other" | "o" | "x" => Some(Self::Other),
            _ => None,
        }
    }
}

/// One submitted billing claim, already validated at intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub patient_id: String,
    pub age: u8,
    pub gender: Gender,
    pub diagnosis_code: String,
    pub procedure_code: String,
    pub treatment_cost: Decimal,
    pub insurance_coverage_limit: Decimal,
    pub claim_date: NaiveDate,
    pub hospital_id: String,
}

impl ClaimRecord {
    /// cost / max(coverage, epsilon)
    pub fn cost_coverage_ratio(&self, epsilon: f64) -> f64 {
        let cost = self.treatment_cost.to_f64().unwrap_or(f64::MAX);
        let coverage = self.insurance_coverage_limit.to_f64().unwrap_or(0.0);
        cost / coverage.max(epsilon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure alone forces rejection
    Critical,
    /// Failure only escalates scrutiny
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        }
    }
}

/// The fixed battery of compliance checks, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    CoverageLimit,
    DiagnosisProcedureMapping,
    CostRange,
    AgeSpecific,
    DuplicateDetection,
    PatternAnalysis,
}

impl RuleId {
    pub const ALL: [RuleId; 6] = [
        RuleId::CoverageLimit,
        RuleId::DiagnosisProcedureMapping,
        RuleId::CostRange,
        RuleId::AgeSpecific,
        RuleId::DuplicateDetection,
        RuleId::PatternAnalysis,
    ];

    pub fn severity(self) -> Severity {
        match self {
            Self::CoverageLimit | Self::DiagnosisProcedureMapping | Self::DuplicateDetection => {
                Severity::Critical
            }
            Self::CostRange | Self::AgeSpecific | Self::PatternAnalysis => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoverageLimit => "coverage_limit",
            Self::DiagnosisProcedureMapping => "diagnosis_procedure_mapping",
            Self::CostRange => "cost_range",
            Self::AgeSpecific => "age_specific",
            Self::DuplicateDetection => "duplicate_detection",
            Self::PatternAnalysis => "pattern_analysis",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CoverageLimit => "Coverage Limit",
            Self::DiagnosisProcedureMapping => "Diagnosis-Procedure Mapping",
            Self::CostRange => "Cost Range",
            Self::AgeSpecific => "Age-Specific Validation",
            Self::DuplicateDetection => "Duplicate Detection",
            Self::PatternAnalysis => "Pattern Analysis",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Machine-readable reason attached to a failed rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    CostExceedsLimit,
    InvalidDiagnosis,
    MismatchDiagnosisProcedure,
    CostOutOfRange,
    AgeRestriction,
    DuplicateClaim,
    CostToCoverageRatio,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CostExceedsLimit => "COST_EXCEEDS_LIMIT",
            Self::InvalidDiagnosis => "INVALID_DIAGNOSIS",
            Self::MismatchDiagnosisProcedure => "MISMATCH_DIAGNOSIS_PROCEDURE",
            Self::CostOutOfRange => "COST_OUT_OF_RANGE",
            Self::AgeRestriction => "AGE_RESTRICTION",
            Self::DuplicateClaim => "DUPLICATE_CLAIM",
            Self::CostToCoverageRatio => "COST_TO_COVERAGE_RATIO",
        }
    }

    /// Anomaly category written to the audit trail for critical hits
    pub fn anomaly_type(self) -> &'static str {
        match self {
            Self::CostExceedsLimit => "over_coverage",
            Self::InvalidDiagnosis | Self::MismatchDiagnosisProcedure => "invalid_mapping",
            Self::DuplicateClaim => "duplicate",
            Self::CostOutOfRange => "cost_out_of_range",
            Self::AgeRestriction => "age_restriction",
            Self::CostToCoverageRatio => "high_cost_ratio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleId,
    pub passed: bool,
    pub reason: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationCode>,
}

impl RuleOutcome {
    pub fn pass(rule: RuleId, reason: impl Into<String>) -> Self {
        Self {
            rule,
            passed: true,
            reason: reason.into(),
            severity: rule.severity(),
            violation: None,
        }
    }

    pub fn fail(rule: RuleId, violation: ViolationCode, reason: impl Into<String>) -> Self {
        Self {
            rule,
            passed: false,
            reason: reason.into(),
            severity: rule.severity(),
            violation: Some(violation),
        }
    }

    pub fn is_critical_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Critical
    }

    pub fn is_warning_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }
}

/// Where a model score came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ScoreSource {
    Model,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_id: String,
    pub probability: f64,
    #[serde(flatten)]
    pub source: ScoreSource,
}

impl ModelScore {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ScoreSource::Fallback { .. })
    }
}

/// Single fraud probability in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusedScore(f64);

impl FusedScore {
    /// Clamps into [0, 1]; a non-finite input becomes the neutral 0.5
    pub fn new(probability: f64) -> Self {
        if probability.is_finite() {
            Self(probability.clamp(0.0, 1.0))
        } else {
            Self(0.5)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Rounded whole-number percentage
    pub fn percent(self) -> u8 {
        // value is clamped to [0, 1], so the product fits in u8
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.0 * 100.0).round() as u8;
        pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Approved,
    Rejected,
    ManualReview,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ManualReview => "manual_review",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::ManualReview => "Manual Review",
        })
    }
}

/// Outcome of one validation request
///
/// Built once by the engine and never mutated afterwards; fields are only
/// reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    claim_id: String,
    claim_date: NaiveDate,
    claimed_amount: Decimal,
    disposition: Disposition,
    fused_score: FusedScore,
    rule_outcomes: Vec<RuleOutcome>,
    triggered_critical: Vec<RuleId>,
    model_scores: Vec<ModelScore>,
    model_version: String,
}

impl DecisionRecord {
    pub(crate) fn new(
        claim: &ClaimRecord,
        disposition: Disposition,
        fused_score: FusedScore,
        rule_outcomes: Vec<RuleOutcome>,
        model_scores: Vec<ModelScore>,
        model_version: String,
    ) -> Self {
        let triggered_critical = rule_outcomes
            .iter()
            .filter(|o| o.is_critical_failure())
            .map(|o| o.rule)
            .collect();
        Self {
            claim_id: claim.claim_id.clone(),
            claim_date: claim.claim_date,
            claimed_amount: claim.treatment_cost,
            disposition,
            fused_score,
            rule_outcomes,
            triggered_critical,
            model_scores,
            model_version,
        }
    }

    pub fn claim_id(&self) -> &str {
        &self.claim_id
    }

    pub fn claim_date(&self) -> NaiveDate {
        self.claim_date
    }

    pub fn claimed_amount(&self) -> Decimal {
        self.claimed_amount
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn fused_score(&self) -> FusedScore {
        self.fused_score
    }

    pub fn rule_outcomes(&self) -> &[RuleOutcome] {
        &self.rule_outcomes
    }

    pub fn triggered_critical(&self) -> &[RuleId] {
        &self.triggered_critical
    }

    pub fn model_scores(&self) -> &[ModelScore] {
        &self.model_scores
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rule_outcomes.iter().filter(|o| !o.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gender_parsing() {
        assert_eq!(Gender::parse("m"), Some(Gender::Male));
        assert_eq!(Gender::parse(" Female "), Some(Gender::Female));
        assert_eq!(Gender::parse("OTHER"), Some(Gender::Other));
        assert_eq!(Gender::parse("unknown"), None);
    }

    #[test]
    fn rule_order_and_severity() {
        let critical: Vec<_> = RuleId::ALL
            .iter()
            .filter(|r| r.severity() == Severity::Critical)
            .collect();
        assert_eq!(
            critical,
            vec![&RuleId::CoverageLimit, &RuleId::DiagnosisProcedureMapping, &RuleId::DuplicateDetection]
        );
        assert_eq!(RuleId::ALL[4], RuleId::DuplicateDetection);
    }

    #[test]
    fn fused_score_clamps() {
        assert_eq!(FusedScore::new(1.7).value(), 1.0);
        assert_eq!(FusedScore::new(-0.2).value(), 0.0);
        assert_eq!(FusedScore::new(f64::NAN).value(), 0.5);
        assert_eq!(FusedScore::new(0.256).percent(), 26);
    }

    #[test]
    fn ratio_uses_epsilon_floor() {
        let claim = ClaimRecord {
            claim_id: "CLM1".into(),
            patient_id: "P0001".into(),
            age: 40,
            gender: Gender::Female,
            diagnosis_code: "I10".into(),
            procedure_code: "93000".into(),
            treatment_cost: dec!(300),
            insurance_coverage_limit: dec!(0),
            claim_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            hospital_id: "H0001".into(),
        };
        assert_eq!(claim.cost_coverage_ratio(1.0), 300.0);
    }

    #[test]
    fn gender_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"M\"");
        assert_eq!(serde_json::from_str::<Gender>("\"Other\"").unwrap(), Gender::Other);
    }
}
