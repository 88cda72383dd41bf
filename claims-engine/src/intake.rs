use crate::error::{ClaimsError, ClaimsResult, FieldViolation};
use crate::models::{ClaimRecord, Gender};
use chrono::NaiveDate;
use error_common::codes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw claim as handed over by a collaborator
///
/// Every field is optional or free text so that malformed submissions
/// deserialize and can be reported field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClaimSubmission {
    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    #[serde(default)]
    pub claim_id: String,

    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    #[serde(default)]
    pub patient_id: String,

    #[validate(range(min = 0, max = 120, message = "must be between 0 and 120"))]
    #[serde(default)]
    pub age: Option<i64>,

    #[serde(default)]
    pub gender: Option<String>,

    #[validate(length(max = 16, message = "must be at most 16 characters"))]
    #[serde(default)]
    pub diagnosis_code: String,

    #[validate(length(max = 16, message = "must be at most 16 characters"))]
    #[serde(default)]
    pub procedure_code: String,

    #[serde(default)]
    pub treatment_cost: Option<Decimal>,

    #[serde(default)]
    pub insurance_coverage_limit: Option<Decimal>,

    /// ISO date, `YYYY-MM-DD`
    #[serde(default)]
    pub claim_date: Option<String>,

    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    #[serde(default)]
    pub hospital_id: String,
}

impl ClaimSubmission {
    /// Validate and normalize into a [`ClaimRecord`]
    ///
    /// Identifiers are trimmed and the diagnosis code is upper-cased. All
    /// violations are reported together.
    pub fn into_record(self) -> ClaimsResult<ClaimRecord> {
        let mut violations = Vec::new();

        if let Err(errors) = self.validate() {
            for (field, list) in errors.field_errors() {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string);
                    violations.push(FieldViolation::new(
                        field.to_string(),
                        codes::intake::OUT_OF_RANGE,
                        message,
                    ));
                }
            }
            violations.sort_by(|a, b| a.field.cmp(&b.field));
        }

        let claim_id = required_text("claim_id", &self.claim_id, &mut violations);
        let patient_id = required_text("patient_id", &self.patient_id, &mut violations);
        let diagnosis_code =
            required_text("diagnosis_code", &self.diagnosis_code, &mut violations).to_ascii_uppercase();
        let procedure_code = required_text("procedure_code", &self.procedure_code, &mut violations);
        let hospital_id = required_text("hospital_id", &self.hospital_id, &mut violations);

        let age = match self.age {
            None => {
                violations.push(missing("age"));
                None
            }
            Some(age) => u8::try_from(age).ok().filter(|a| *a <= 120),
        };

        let gender = match self.gender.as_deref() {
            None => {
                violations.push(missing("gender"));
                None
            }
            Some(raw) => {
                let parsed = Gender::parse(raw);
                if parsed.is_none() {
                    violations.push(FieldViolation::new(
                        "gender",
                        codes::intake::INVALID_FORMAT,
                        format!("must be one of M, F, Other, got {raw:?}"),
                    ));
                }
                parsed
            }
        };

        let treatment_cost = match self.treatment_cost {
            None => {
                violations.push(missing("treatment_cost"));
                None
            }
            Some(cost) if cost <= Decimal::ZERO => {
                violations.push(FieldViolation::new(
                    "treatment_cost",
                    codes::intake::OUT_OF_RANGE,
                    "must be greater than zero",
                ));
                None
            }
            Some(cost) => Some(cost),
        };

        let coverage = match self.insurance_coverage_limit {
            None => {
                violations.push(missing("insurance_coverage_limit"));
                None
            }
            Some(limit) if limit < Decimal::ZERO => {
                violations.push(FieldViolation::new(
                    "insurance_coverage_limit",
                    codes::intake::OUT_OF_RANGE,
                    "must not be negative",
                ));
                None
            }
            Some(limit) => Some(limit),
        };

        let claim_date = match self.claim_date.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push(missing("claim_date"));
                None
            }
            Some(raw) => {
                let parsed = NaiveDate::parse_from_str(raw, DATE_FORMAT).ok();
                if parsed.is_none() {
                    violations.push(FieldViolation::new(
                        "claim_date",
                        codes::intake::INVALID_FORMAT,
                        format!("must be a date in YYYY-MM-DD format, got {raw:?}"),
                    ));
                }
                parsed
            }
        };

        match (age, gender, treatment_cost, coverage, claim_date) {
            (Some(age), Some(gender), Some(treatment_cost), Some(insurance_coverage_limit), Some(claim_date))
                if violations.is_empty() =>
            {
                Ok(ClaimRecord {
                    claim_id,
                    patient_id,
                    age,
                    gender,
                    diagnosis_code,
                    procedure_code,
                    treatment_cost,
                    insurance_coverage_limit,
                    claim_date,
                    hospital_id,
                })
            }
            _ => Err(ClaimsError::Intake(violations)),
        }
    }
}

fn missing(field: &str) -> FieldViolation {
    FieldViolation::new(field, codes::intake::MISSING_REQUIRED_FIELD, "is required")
}

fn required_text(field: &str, value: &str, violations: &mut Vec<FieldViolation>) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        violations.push(missing(field));
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn submission() -> ClaimSubmission {
        ClaimSubmission {
            claim_id: " CLM000001 ".into(),
            patient_id: "P1001".into(),
            age: Some(45),
            gender: Some("M".into()),
            diagnosis_code: "e10".into(),
            procedure_code: "99213".into(),
            treatment_cost: Some(dec!(200)),
            insurance_coverage_limit: Some(dec!(5000)),
            claim_date: Some("2024-01-15".into()),
            hospital_id: "H0001".into(),
        }
    }

    #[test]
    fn normalizes_valid_submission() {
        let record = submission().into_record().unwrap();
        assert_eq!(record.claim_id, "CLM000001");
        assert_eq!(record.diagnosis_code, "E10");
        assert_eq!(record.claim_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn reports_every_bad_field() {
        let mut bad = submission();
        bad.age = Some(130);
        bad.claim_id = String::new();
        bad.claim_date = Some("15/01/2024".into());
        bad.treatment_cost = Some(dec!(0));

        let ClaimsError::Intake(violations) = bad.into_record().unwrap_err() else {
            panic!("expected intake error");
        };
        let mut fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        fields.sort_unstable();
        assert_eq!(fields, vec!["age", "claim_date", "claim_id", "treatment_cost"]);
    }

    #[test]
    fn format_errors_echo_the_value() {
        let mut bad = submission();
        bad.gender = Some("male-ish".into());
        let ClaimsError::Intake(violations) = bad.into_record().unwrap_err() else {
            panic!("expected intake error");
        };
        assert_eq!(violations[0].message, "must be one of M, F, Other, got \"male-ish\"");
    }

    #[test]
    fn missing_fields_use_required_code() {
        let ClaimsError::Intake(violations) = ClaimSubmission::default().into_record().unwrap_err() else {
            panic!("expected intake error");
        };
        assert!(violations
            .iter()
            .all(|v| v.code == codes::intake::MISSING_REQUIRED_FIELD));
        assert_eq!(violations.len(), 10);
    }

    #[test]
    fn zero_coverage_is_accepted() {
        let mut s = submission();
        s.insurance_coverage_limit = Some(dec!(0));
        assert!(s.into_record().is_ok());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{"claim_id":"C1","patient_id":"P1","age":30,"gender":"female",
            "diagnosis_code":"I10","procedure_code":"93000","treatment_cost":"250.00",
            "insurance_coverage_limit":"8000","claim_date":"2024-02-01","hospital_id":"H0002"}"#;
        let record = serde_json::from_str::<ClaimSubmission>(json)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(record.gender, Gender::Female);
        assert_eq!(record.treatment_cost, dec!(250.00));
    }
}
