use crate::error::LoggerError;
use base64::{engine::general_purpose, Engine as _};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const SSN_PATTERN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const PHONE_PATTERN: &str = r"(?:\+1[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b";
const MRN_PATTERN: &str = r"\bMRN\d+\b";
const DEFAULT_PATIENT_PATTERN: &str = r"\bP\d{4,}\b";

/// Categories of protected data the redactor recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhiKind {
    Email,
    Ssn,
    Phone,
    Mrn,
    PatientId,
}

impl PhiKind {
    fn label(self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Ssn => "SSN",
            Self::Phone => "PHONE",
            Self::Mrn => "MRN",
            Self::PatientId => "PATIENT",
        }
    }

    fn mask(self) -> &'static str {
        match self {
            Self::Email => "***@***",
            Self::Ssn => "***-**-****",
            Self::Phone => "(***) ***-****",
            Self::Mrn => "MRN******",
            Self::PatientId => "P****",
        }
    }
}

/// PHI redaction configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_ssn: bool,
    pub redact_phones: bool,
    pub redact_mrn: bool,
    pub redact_patient_ids: bool,
    /// Replace matches with a stable hash token instead of a fixed mask
    pub hash_for_correlation: bool,
    /// Pattern recognising patient identifiers in free text
    pub patient_id_pattern: String,
    /// Extra `(pattern, replacement)` pairs applied last
    pub custom_patterns: Vec<(String, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_ssn: true,
            redact_phones: true,
            redact_mrn: true,
            redact_patient_ids: true,
            hash_for_correlation: true,
            patient_id_pattern: DEFAULT_PATIENT_PATTERN.to_string(),
            custom_patterns: Vec::new(),
        }
    }
}

/// Redactor for free-text log messages
///
/// Rules apply in a fixed order: SSN before phone so that a social security
/// number is never half-consumed by the looser phone pattern.
pub struct PhiRedactor {
    rules: Vec<(PhiKind, Regex)>,
    custom: Vec<(Regex, String)>,
    hash_for_correlation: bool,
}

impl PhiRedactor {
    pub fn new(config: &RedactionConfig) -> Result<Self, LoggerError> {
        let mut rules = Vec::new();
        let enabled = [
            (config.redact_emails, PhiKind::Email, EMAIL_PATTERN),
            (config.redact_ssn, PhiKind::Ssn, SSN_PATTERN),
            (config.redact_phones, PhiKind::Phone, PHONE_PATTERN),
            (config.redact_mrn, PhiKind::Mrn, MRN_PATTERN),
            (config.redact_patient_ids, PhiKind::PatientId, config.patient_id_pattern.as_str()),
        ];
        for (on, kind, pattern) in enabled {
            if on {
                rules.push((kind, Regex::new(pattern)?));
            }
        }

        let custom = config
            .custom_patterns
            .iter()
            .map(|(pattern, replacement)| Ok((Regex::new(pattern)?, replacement.clone())))
            .collect::<Result<Vec<_>, LoggerError>>()?;

        Ok(Self {
            rules,
            custom,
            hash_for_correlation: config.hash_for_correlation,
        })
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        for (kind, regex) in &self.rules {
            result = regex
                .replace_all(&result, |caps: &Captures| self.replacement(*kind, &caps[0]))
                .into_owned();
        }

        for (pattern, replacement) in &self.custom {
            result = pattern.replace_all(&result, replacement.as_str()).into_owned();
        }

        result
    }

    fn replacement(&self, kind: PhiKind, matched: &str) -> String {
        if self.hash_for_correlation {
            format!("{}[{}]", kind.label(), hash_value(matched))
        } else {
            kind.mask().to_string()
        }
    }
}

/// Correlation token for a patient identifier
///
/// The same identifier always yields the same token, so log lines for one
/// patient can be joined without exposing the identifier.
pub fn patient_token(patient_id: &str) -> String {
    format!("PT-{}", hash_value(patient_id))
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn masking_redactor() -> PhiRedactor {
        PhiRedactor::new(&RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_email_redaction() {
        let redacted = masking_redactor().redact("Claim uploaded by john.doe@example.com");
        assert_eq!(redacted, "Claim uploaded by ***@***");
    }

    #[test]
    fn test_ssn_not_eaten_by_phone_rule() {
        let redacted = masking_redactor().redact("SSN 123-45-6789, phone (555) 123-4567");
        assert_eq!(redacted, "SSN ***-**-****, phone (***) ***-****");
    }

    #[test]
    fn test_patient_and_mrn_redaction() {
        let redacted = masking_redactor().redact("patient P00042 with MRN123456");
        assert_eq!(redacted, "patient P**** with MRN******");
    }

    #[test]
    fn test_hashed_tokens_are_stable() {
        let redactor = PhiRedactor::new(&RedactionConfig::default()).unwrap();
        let a = redactor.redact("P12345 resubmitted");
        let b = redactor.redact("P12345 resubmitted");
        assert_eq!(a, b);
        assert!(a.starts_with("PATIENT["));
        assert!(!a.contains("P12345"));
    }

    #[test]
    fn test_patient_token() {
        assert_eq!(patient_token("P1001"), patient_token("P1001"));
        assert_ne!(patient_token("P1001"), patient_token("P1002"));
        assert!(patient_token("P1001").starts_with("PT-"));
    }

    #[test]
    fn test_invalid_custom_pattern_rejected() {
        let config = RedactionConfig {
            custom_patterns: vec![("(".to_string(), "x".to_string())],
            ..Default::default()
        };
        assert!(matches!(PhiRedactor::new(&config), Err(LoggerError::InvalidPattern(_))));
    }
}
