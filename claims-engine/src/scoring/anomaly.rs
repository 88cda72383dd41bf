use super::check_features;
use crate::error::ScoringError;
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Distance-based outlier scorer
///
/// The raw score is the mean squared standardized distance of selected
/// features from their centers. It is calibrated into a pseudo-probability
/// by its rank among `reference_scores`, a sorted sample of raw scores
/// from normal claims: piecewise-linear through `(0, 0)` and
/// `(reference_scores[k], (k + 1) / (n + 1))`, rising to 1 at twice the
/// largest reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityOutlierModel {
    pub input_dimension: usize,
    pub features: Vec<usize>,
    pub centers: Vec<f64>,
    pub spreads: Vec<f64>,
    pub reference_scores: Vec<f64>,
}

impl DensityOutlierModel {
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        check_features(features, self.input_dimension)?;
        let raw = self.raw_score(features)?;
        Ok(self.calibrate(raw))
    }

    fn raw_score(&self, features: &FeatureVector) -> Result<f64, ScoringError> {
        if self.features.is_empty() {
            return Err(ScoringError::MalformedModel("no features selected".to_string()));
        }
        let mut total = 0.0;
        for ((index, center), spread) in self.features.iter().zip(&self.centers).zip(&self.spreads) {
            let value = features.get(*index).ok_or_else(|| {
                ScoringError::MalformedModel(format!("selected feature {index} is missing"))
            })?;
            let z = (value - center) / spread;
            total += z * z;
        }
        Ok(total / self.features.len() as f64)
    }

    fn calibrate(&self, raw: f64) -> f64 {
        let n = self.reference_scores.len() as f64;
        let step = 1.0 / (n + 1.0);
        let mut previous = (0.0, 0.0);
        for (k, reference) in self.reference_scores.iter().enumerate() {
            let point = (*reference, (k + 1) as f64 * step);
            if raw <= point.0 {
                return interpolate(previous, point, raw);
            }
            previous = point;
        }
        let end = (previous.0 * 2.0, 1.0);
        if raw >= end.0 {
            1.0
        } else {
            interpolate(previous, end, raw)
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.features.is_empty() {
            return Err("outlier model selects no features".to_string());
        }
        if self.centers.len() != self.features.len() || self.spreads.len() != self.features.len() {
            return Err("outlier model centers and spreads must match its features".to_string());
        }
        if self.features.iter().any(|f| *f >= self.input_dimension) {
            return Err("outlier model selects a feature beyond the input dimension".to_string());
        }
        if self.spreads.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err("outlier model spreads must be positive".to_string());
        }
        if self.reference_scores.is_empty()
            || self.reference_scores.iter().any(|r| !(r.is_finite() && *r > 0.0))
            || self.reference_scores.windows(2).any(|w| w[0] >= w[1])
        {
            return Err("outlier model reference scores must be positive and strictly increasing".to_string());
        }
        Ok(())
    }
}

fn interpolate(from: (f64, f64), to: (f64, f64), x: f64) -> f64 {
    let width = to.0 - from.0;
    if width <= 0.0 {
        return to.1;
    }
    from.1 + (to.1 - from.1) * ((x - from.0) / width)
}
