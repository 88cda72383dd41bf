use crate::models::ClaimRecord;
use crate::tables::{default_diagnosis_codes, default_procedure_codes};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Encoded value for a categorical field absent from its vocabulary
pub const UNKNOWN_CATEGORY: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Age,
    TreatmentCost,
    InsuranceCoverageLimit,
    CostCoverageRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Gender,
    DiagnosisCode,
    ProcedureCode,
    HospitalId,
}

/// Standard scaling for one numeric feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaling {
    pub field: NumericField,
    pub mean: f64,
    pub std_dev: f64,
}

/// Label encoding for one categorical feature
///
/// A value at position `i` of the vocabulary encodes as `i + 1`; anything
/// else encodes as [`UNKNOWN_CATEGORY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoding {
    pub field: CategoricalField,
    pub vocabulary: Vec<String>,
}

impl CategoricalEncoding {
    fn encode(&self, value: &str) -> f64 {
        self.vocabulary
            .iter()
            .position(|v| v == value)
            .map_or(UNKNOWN_CATEGORY, |i| (i + 1) as f64)
    }
}

/// Versioned mapping from a claim to the numeric vector the models consume
///
/// The vector holds the scaled numeric features in declaration order,
/// followed by the encoded categorical features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub version: String,
    pub ratio_epsilon: f64,
    pub numeric: Vec<NumericScaling>,
    pub categorical: Vec<CategoricalEncoding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl FeatureSpec {
    pub fn dimension(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn transform(&self, claim: &ClaimRecord) -> FeatureVector {
        let numeric = self.numeric.iter().map(|scaling| {
            let raw = match scaling.field {
                NumericField::Age => f64::from(claim.age),
                NumericField::TreatmentCost => claim.treatment_cost.to_f64().unwrap_or(0.0),
                NumericField::InsuranceCoverageLimit => {
                    claim.insurance_coverage_limit.to_f64().unwrap_or(0.0)
                }
                NumericField::CostCoverageRatio => claim.cost_coverage_ratio(self.ratio_epsilon),
            };
            if scaling.std_dev > 0.0 {
                (raw - scaling.mean) / scaling.std_dev
            } else {
                0.0
            }
        });

        let categorical = self.categorical.iter().map(|encoding| {
            let value = match encoding.field {
                CategoricalField::Gender => claim.gender.code(),
                CategoricalField::DiagnosisCode => claim.diagnosis_code.as_str(),
                CategoricalField::ProcedureCode => claim.procedure_code.as_str(),
                CategoricalField::HospitalId => claim.hospital_id.as_str(),
            };
            encoding.encode(value)
        });

        FeatureVector(numeric.chain(categorical).collect())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        if self.version.trim().is_empty() {
            problems.push("features.version must not be empty".to_string());
        }
        if self.ratio_epsilon <= 0.0 {
            problems.push("features.ratio_epsilon must be positive".to_string());
        }
        for scaling in &self.numeric {
            if !(scaling.std_dev.is_finite() && scaling.std_dev > 0.0) || !scaling.mean.is_finite() {
                problems.push(format!(
                    "features.numeric.{:?}: mean and std_dev must be finite with std_dev > 0",
                    scaling.field
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

impl Default for FeatureSpec {
    fn default() -> Self {
        let scale = |field, mean, std_dev| NumericScaling { field, mean, std_dev };
        let hospitals = (1..=10).map(|n| format!("H{n:04}")).collect();
        Self {
            version: "claims-features-v1".to_string(),
            ratio_epsilon: 1.0,
            numeric: vec![
                scale(NumericField::Age, 50.0, 20.0),
                scale(NumericField::TreatmentCost, 2000.0, 3000.0),
                scale(NumericField::InsuranceCoverageLimit, 10000.0, 8000.0),
                scale(NumericField::CostCoverageRatio, 0.3, 0.4),
            ],
            categorical: vec![
                CategoricalEncoding {
                    field: CategoricalField::Gender,
                    vocabulary: vec!["M".into(), "F".into(), "Other".into()],
                },
                CategoricalEncoding {
                    field: CategoricalField::DiagnosisCode,
                    vocabulary: default_diagnosis_codes(),
                },
                CategoricalEncoding {
                    field: CategoricalField::ProcedureCode,
                    vocabulary: default_procedure_codes(),
                },
                CategoricalEncoding {
                    field: CategoricalField::HospitalId,
                    vocabulary: hospitals,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn claim() -> ClaimRecord {
        ClaimRecord {
            claim_id: "CLM000001".into(),
            patient_id: "P1001".into(),
            age: 45,
            gender: Gender::Male,
            diagnosis_code: "E10".into(),
            procedure_code: "99213".into(),
            treatment_cost: dec!(200),
            insurance_coverage_limit: dec!(5000),
            claim_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            hospital_id: "H0001".into(),
        }
    }

    #[test]
    fn scales_numeric_features() {
        let v = FeatureSpec::default().transform(&claim());
        assert_eq!(v.len(), 8);
        assert!((v.get(0).unwrap() - (-0.25)).abs() < 1e-9);
        assert!((v.get(1).unwrap() - (-0.6)).abs() < 1e-9);
        assert!((v.get(2).unwrap() - (-0.625)).abs() < 1e-9);
        assert!((v.get(3).unwrap() - (-0.65)).abs() < 1e-9);
    }

    #[test]
    fn encodes_known_and_unknown_categories() {
        let spec = FeatureSpec::default();
        let v = spec.transform(&claim());
        assert_eq!(v.get(4), Some(1.0));
        assert_eq!(v.get(5), Some(1.0));
        assert_eq!(v.get(7), Some(1.0));

        let mut unseen = claim();
        unseen.hospital_id = "H9999".into();
        unseen.diagnosis_code = "Q00".into();
        let v = spec.transform(&unseen);
        assert_eq!(v.get(5), Some(UNKNOWN_CATEGORY));
        assert_eq!(v.get(7), Some(UNKNOWN_CATEGORY));
    }

    #[test]
    fn transform_is_deterministic() {
        let spec = FeatureSpec::default();
        assert_eq!(spec.transform(&claim()), spec.transform(&claim()));
        assert_eq!(spec.dimension(), 8);
    }

    #[test]
    fn zero_std_dev_rejected() {
        let mut spec = FeatureSpec::default();
        spec.numeric[0].std_dev = 0.0;
        assert_eq!(spec.validate().unwrap_err().len(), 1);
    }
}
