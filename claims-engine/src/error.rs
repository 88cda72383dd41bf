use error_common::{codes, ClaimGuardError};
use serde::Serialize;
use thiserror::Error;

/// A single field that failed intake validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Claim rejected at intake: {}", describe(.0))]
    Intake(Vec<FieldViolation>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigLoad(#[from] config_engine::ConfigError),

    #[error("Validation task failed: {0}")]
    TaskFailed(String),
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reasons a single scorer could not produce a usable probability
///
/// None of these fail a request: the ensemble substitutes the fallback
/// probability and records the reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("scorer timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    #[error("feature vector has {actual} values, model expects {expected}")]
    MalformedFeatures { expected: usize, actual: usize },

    #[error("feature {0} is not a finite number")]
    NonFiniteFeature(usize),

    #[error("model artifact is malformed: {0}")]
    MalformedModel(String),

    #[error("scorer returned {0}, outside [0, 1]")]
    InvalidProbability(f64),
}

impl ScoringError {
    /// Short label for metrics and audit payloads
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Unavailable(_) => "unavailable",
            Self::MalformedFeatures { .. } | Self::NonFiniteFeature(_) => "malformed_features",
            Self::MalformedModel(_) => "malformed_model",
            Self::InvalidProbability(_) => "invalid_probability",
        }
    }
}

pub type ClaimsResult<T> = Result<T, ClaimsError>;

impl From<ClaimsError> for ClaimGuardError {
    fn from(err: ClaimsError) -> Self {
        match err {
            ClaimsError::Intake(ref violations) => {
                let code = violations
                    .first()
                    .map_or(codes::intake::INVALID_FORMAT, |v| v.code);
                ClaimGuardError::validation(code, err.to_string())
            }
            ClaimsError::Config(msg) => ClaimGuardError::config(codes::config::INVALID_VALUE, msg),
            ClaimsError::ConfigLoad(inner) => inner.into(),
            ClaimsError::TaskFailed(msg) => ClaimGuardError::Internal(msg),
        }
    }
}

impl From<ScoringError> for ClaimGuardError {
    fn from(err: ScoringError) -> Self {
        let code = match err {
            ScoringError::Timeout { .. } => codes::scoring::SCORER_TIMEOUT,
            ScoringError::InvalidProbability(_) => codes::scoring::INVALID_PROBABILITY,
            ScoringError::MalformedFeatures { .. } | ScoringError::NonFiniteFeature(_) => {
                codes::scoring::MALFORMED_FEATURES
            }
            ScoringError::Unavailable(_) | ScoringError::MalformedModel(_) => {
                codes::scoring::SCORER_FAILED
            }
        };
        ClaimGuardError::scoring(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_error_carries_first_code() {
        let err = ClaimsError::Intake(vec![
            FieldViolation::new("age", codes::intake::OUT_OF_RANGE, "must be between 0 and 120"),
            FieldViolation::new("claim_id", codes::intake::MISSING_REQUIRED_FIELD, "is required"),
        ]);
        assert!(err.to_string().contains("age (must be between 0 and 120)"));
        let converted: ClaimGuardError = err.into();
        assert_eq!(converted.code(), codes::intake::OUT_OF_RANGE);
        assert_eq!(converted.error_type(), "validation");
    }

    #[test]
    fn scoring_error_codes() {
        let converted: ClaimGuardError = ScoringError::Timeout { after_ms: 250 }.into();
        assert_eq!(converted.code(), codes::scoring::SCORER_TIMEOUT);
        assert_eq!(ScoringError::NonFiniteFeature(3).reason(), "malformed_features");
    }
}
