use crate::models::{FusedScore, ModelScore};
use std::collections::BTreeMap;

/// Per-model weights for score fusion
#[derive(Debug, Clone, PartialEq)]
pub struct FusionWeights {
    by_model: BTreeMap<String, f64>,
    default_weight: f64,
    /// Result when there is nothing to fuse
    neutral: f64,
}

impl FusionWeights {
    pub fn new(by_model: BTreeMap<String, f64>, default_weight: f64, neutral: f64) -> Self {
        Self {
            by_model,
            default_weight,
            neutral,
        }
    }

    /// Equal weights for every model
    pub fn uniform() -> Self {
        Self::new(BTreeMap::new(), 1.0, 0.5)
    }

    pub fn weight_for(&self, model_id: &str) -> f64 {
        self.by_model
            .get(model_id)
            .copied()
            .unwrap_or(self.default_weight)
            .max(0.0)
    }
}

/// Weighted mean of the model scores, clamped into [0, 1]
///
/// Terms are summed in model-id order, so the result does not depend on
/// the order scores arrive in. With no scores, or all weights zero, the
/// result is the plain mean or the neutral value.
pub fn fuse(scores: &[ModelScore], weights: &FusionWeights) -> FusedScore {
    if scores.is_empty() {
        return FusedScore::new(weights.neutral);
    }

    let mut ordered: Vec<&ModelScore> = scores.iter().collect();
    ordered.sort_by(|a, b| {
        a.model_id
            .cmp(&b.model_id)
            .then_with(|| a.probability.total_cmp(&b.probability))
    });

    let (weighted, total_weight) = ordered.iter().fold((0.0, 0.0), |(sum, total), score| {
        let w = weights.weight_for(&score.model_id);
        (sum + w * score.probability, total + w)
    });

    if total_weight > 0.0 {
        FusedScore::new(weighted / total_weight)
    } else {
        let plain = ordered.iter().map(|s| s.probability).sum::<f64>() / ordered.len() as f64;
        FusedScore::new(plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreSource;
    use proptest::prelude::*;

    fn score(id: &str, p: f64) -> ModelScore {
        ModelScore {
            model_id: id.to_string(),
            probability: p,
            source: ScoreSource::Model,
        }
    }

    #[test]
    fn equal_weights_give_mean() {
        let fused = fuse(
            &[score("a", 0.2), score("b", 0.4), score("c", 0.9)],
            &FusionWeights::uniform(),
        );
        assert!((fused.value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn configured_weights_apply() {
        let mut by_model = BTreeMap::new();
        by_model.insert("a".to_string(), 3.0);
        let weights = FusionWeights::new(by_model, 1.0, 0.5);
        let fused = fuse(&[score("a", 1.0), score("b", 0.0)], &weights);
        assert!((fused.value() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn empty_is_neutral() {
        assert_eq!(fuse(&[], &FusionWeights::uniform()).value(), 0.5);
    }

    #[test]
    fn zero_weights_use_plain_mean() {
        let weights = FusionWeights::new(BTreeMap::new(), 0.0, 0.5);
        let fused = fuse(&[score("a", 0.2), score("b", 0.6)], &weights);
        assert!((fused.value() - 0.4).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn fused_score_is_order_independent(
            probs in prop::collection::vec(0.0f64..=1.0, 1..6),
            weights in prop::collection::vec(0.0f64..5.0, 6),
            rotation in 0usize..6,
        ) {
            let scores: Vec<ModelScore> = probs
                .iter()
                .enumerate()
                .map(|(i, p)| score(&format!("m{i}"), *p))
                .collect();
            let by_model = weights
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("m{i}"), *w))
                .collect();
            let weights = FusionWeights::new(by_model, 1.0, 0.5);

            let mut shuffled = scores.clone();
            shuffled.reverse();
            let len = shuffled.len();
            shuffled.rotate_left(rotation % len);

            let a = fuse(&scores, &weights).value();
            let b = fuse(&shuffled, &weights).value();
            prop_assert_eq!(a.to_bits(), b.to_bits());
            prop_assert!((0.0..=1.0).contains(&a));
        }
    }
}
