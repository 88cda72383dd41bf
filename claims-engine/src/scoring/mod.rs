//! Fraud-probability scorers and their parameter artifacts

pub mod anomaly;
pub mod forest;
pub mod linear;

pub use anomaly::DensityOutlierModel;
pub use forest::{DecisionTree, TreeEnsemble, TreeNode};
pub use linear::LogisticModel;

use crate::error::{ClaimsError, ClaimsResult, ScoringError};
use crate::features::{FeatureSpec, FeatureVector};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const LOGISTIC_MODEL_ID: &str = "logistic";
pub const FOREST_MODEL_ID: &str = "forest";
pub const ANOMALY_MODEL_ID: &str = "anomaly";

/// Anything that can turn a feature vector into a fraud probability
///
/// Implementations may be slow or fail; the ensemble bounds each call
/// with a timeout and substitutes a fallback on error.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, features: &FeatureVector) -> Result<f64, ScoringError>;
}

/// Built-in model families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringModel {
    Logistic(LogisticModel),
    TreeEnsemble(TreeEnsemble),
    DensityOutlier(DensityOutlierModel),
}

impl ScoringModel {
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        match self {
            Self::Logistic(model) => model.predict(features),
            Self::TreeEnsemble(model) => model.predict(features),
            Self::DensityOutlier(model) => model.predict(features),
        }
    }

    fn input_dimension(&self) -> usize {
        match self {
            Self::Logistic(model) => model.coefficients.len(),
            Self::TreeEnsemble(model) => model.input_dimension,
            Self::DensityOutlier(model) => model.input_dimension,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Logistic(model) if model.coefficients.iter().any(|c| !c.is_finite()) => {
                Err("logistic coefficients must be finite".to_string())
            }
            Self::Logistic(_) => Ok(()),
            Self::TreeEnsemble(model) => model.validate(),
            Self::DensityOutlier(model) => model.validate(),
        }
    }
}

#[async_trait]
impl Scorer for ScoringModel {
    async fn score(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        self.predict(features)
    }
}

pub(crate) fn check_features(features: &FeatureVector, expected: usize) -> Result<(), ScoringError> {
    if features.len() != expected {
        return Err(ScoringError::MalformedFeatures {
            expected,
            actual: features.len(),
        });
    }
    match features.as_slice().iter().position(|x| !x.is_finite()) {
        Some(index) => Err(ScoringError::NonFiniteFeature(index)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub id: String,
    pub model: ScoringModel,
}

/// Versioned bundle of feature transform and model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub version: String,
    pub features: FeatureSpec,
    pub models: Vec<ModelArtifact>,
}

impl ModelArtifacts {
    /// Read a YAML or JSON bundle and check it is self-consistent
    pub fn from_file(path: &Path) -> ClaimsResult<Self> {
        let artifacts: Self = config_engine::load_document(path)?;
        artifacts.validate().map_err(ClaimsError::Config)?;
        tracing::info!(
            path = %path.display(),
            version = %artifacts.version,
            models = artifacts.models.len(),
            "model artifacts loaded"
        );
        Ok(artifacts)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.features.validate().map_err(|problems| problems.join("; "))?;
        let dimension = self.features.dimension();
        let mut ids = HashSet::new();
        for artifact in &self.models {
            if !ids.insert(artifact.id.as_str()) {
                return Err(format!("model id {} appears twice", artifact.id));
            }
            if artifact.model.input_dimension() != dimension {
                return Err(format!(
                    "model {} expects {} features, transform produces {}",
                    artifact.id,
                    artifact.model.input_dimension(),
                    dimension
                ));
            }
            artifact
                .model
                .validate()
                .map_err(|reason| format!("model {}: {reason}", artifact.id))?;
        }
        Ok(())
    }

    /// Parameters shipped with the engine
    ///
    /// Feature layout is `[age, cost, coverage, ratio]` standard-scaled,
    /// then gender, diagnosis, procedure and hospital label codes.
    pub fn builtin() -> Self {
        let features = FeatureSpec::default();
        let dimension = features.dimension();

        let logistic = LogisticModel {
            intercept: -1.5,
            coefficients: vec![0.1, 0.9, -0.4, 2.2, 0.0, 0.0, 0.0, 0.0],
        };

        let split = |feature, threshold, left, right| TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
        let leaf = |probability| TreeNode::Leaf { probability };
        let forest = TreeEnsemble {
            input_dimension: dimension,
            trees: vec![
                // cost-to-coverage ratio above 0.85, then absolute cost above 5000
                DecisionTree {
                    nodes: vec![split(3, 1.375, 1, 2), split(1, 1.0, 3, 4), leaf(0.85), leaf(0.08), leaf(0.45)],
                },
                // ratio above 0.3 on a small policy
                DecisionTree {
                    nodes: vec![split(3, 0.0, 1, 2), leaf(0.05), split(2, -0.875, 3, 4), leaf(0.7), leaf(0.45)],
                },
                // elderly patient with above-average cost
                DecisionTree {
                    nodes: vec![
                        split(0, 1.5, 1, 2),
                        split(1, 2.0, 3, 4),
                        split(1, 0.0, 5, 6),
                        leaf(0.1),
                        leaf(0.6),
                        leaf(0.2),
                        leaf(0.65),
                    ],
                },
            ],
        };

        let anomaly = DensityOutlierModel {
            input_dimension: dimension,
            features: vec![0, 1, 2, 3],
            centers: vec![0.0; 4],
            spreads: vec![1.0; 4],
            reference_scores: vec![0.35, 0.6, 0.9, 1.3, 1.8, 2.5, 3.5, 5.0, 8.0, 14.0],
        };

        Self {
            version: "builtin-2024.1".to_string(),
            features,
            models: vec![
                ModelArtifact {
                    id: LOGISTIC_MODEL_ID.to_string(),
                    model: ScoringModel::Logistic(logistic),
                },
                ModelArtifact {
                    id: FOREST_MODEL_ID.to_string(),
                    model: ScoringModel::TreeEnsemble(forest),
                },
                ModelArtifact {
                    id: ANOMALY_MODEL_ID.to_string(),
                    model: ScoringModel::DensityOutlier(anomaly),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimRecord, Gender};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn typical_claim() -> ClaimRecord {
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
    fn builtin_bundle_is_consistent() {
        assert_eq!(ModelArtifacts::builtin().validate(), Ok(()));
    }

    #[test]
    fn typical_claim_scores_low_on_every_model() {
        let artifacts = ModelArtifacts::builtin();
        let features = artifacts.features.transform(&typical_claim());
        for artifact in &artifacts.models {
            let p = artifact.model.predict(&features).unwrap();
            assert!(p < 0.1, "{} scored {p}", artifact.id);
        }
    }

    #[test]
    fn over_coverage_claim_scores_high() {
        let artifacts = ModelArtifacts::builtin();
        let mut claim = typical_claim();
        claim.treatment_cost = dec!(15000);
        let features = artifacts.features.transform(&claim);
        for artifact in &artifacts.models {
            let p = artifact.model.predict(&features).unwrap();
            assert!(p > 0.6, "{} scored {p}", artifact.id);
        }
    }

    #[test]
    fn non_finite_feature_is_rejected() {
        assert_eq!(
            check_features(&FeatureVector::new(vec![1.0, f64::NAN]), 2),
            Err(ScoringError::NonFiniteFeature(1))
        );
    }

    #[test]
    fn mismatched_dimension_fails_validation() {
        let mut artifacts = ModelArtifacts::builtin();
        if let ScoringModel::Logistic(model) = &mut artifacts.models[0].model {
            model.coefficients.pop();
        }
        assert!(artifacts.validate().unwrap_err().contains("expects 7 features"));
    }

    #[test]
    fn round_trips_through_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let yaml = serde_yaml::to_string(&ModelArtifacts::builtin()).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let loaded = ModelArtifacts::from_file(file.path()).unwrap();
        assert_eq!(loaded, ModelArtifacts::builtin());
    }
}
