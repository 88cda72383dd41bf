use super::check_features;
use crate::error::ScoringError;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Logistic regression over the full feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        check_features(features, self.coefficients.len())?;
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.as_slice())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_logit_is_one_half() {
        let model = LogisticModel {
            intercept: 0.0,
            coefficients: vec![1.0, -1.0],
        };
        let p = model.predict(&FeatureVector::new(vec![2.0, 2.0])).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn extreme_logits_stay_in_range() {
        let model = LogisticModel {
            intercept: 0.0,
            coefficients: vec![1000.0],
        };
        assert_eq!(model.predict(&FeatureVector::new(vec![10.0])).unwrap(), 1.0);
        assert_eq!(model.predict(&FeatureVector::new(vec![-10.0])).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let model = LogisticModel {
            intercept: 0.0,
            coefficients: vec![1.0, 1.0, 1.0],
        };
        assert_eq!(
            model.predict(&FeatureVector::new(vec![1.0])),
            Err(ScoringError::MalformedFeatures { expected: 3, actual: 1 })
        );
    }
}
