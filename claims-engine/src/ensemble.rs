use crate::config::EnsembleSettings;
use crate::error::{ClaimsError, ClaimsResult, ScoringError};
use crate::features::FeatureVector;
use crate::fusion::FusionWeights;
use crate::models::{ModelScore, ScoreSource};
use crate::scoring::{ModelArtifacts, Scorer};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A scorer plus the metadata the ensemble needs to run and fuse it
#[derive(Clone)]
pub struct RegisteredScorer {
    pub model_id: String,
    pub weight: f64,
    scorer: Arc<dyn Scorer>,
}

impl std::fmt::Debug for RegisteredScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredScorer")
            .field("model_id", &self.model_id)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Fallback substituted for one scorer on one request
#[derive(Debug, Clone, PartialEq)]
pub struct Degradation {
    pub model_id: String,
    pub error: ScoringError,
}

#[derive(Debug, Clone, Default)]
pub struct EnsembleOutcome {
    /// One score per registered scorer, in registration order
    pub scores: Vec<ModelScore>,
    pub degradations: Vec<Degradation>,
}

/// Runs every registered scorer concurrently
///
/// Each scorer is bounded by the configured timeout. A scorer that times
/// out, errors, or returns a value outside [0, 1] contributes the fallback
/// probability instead, so scoring as a whole never fails.
#[derive(Debug, Clone)]
pub struct ModelEnsemble {
    members: Vec<RegisteredScorer>,
    timeout: Duration,
    fallback_probability: f64,
}

impl ModelEnsemble {
    pub fn new(timeout: Duration, fallback_probability: f64) -> Self {
        Self {
            members: Vec::new(),
            timeout,
            fallback_probability,
        }
    }

    /// Ensemble of the artifact bundle's models, weighted per `settings`
    pub fn from_artifacts(artifacts: &ModelArtifacts, settings: &EnsembleSettings) -> ClaimsResult<Self> {
        let mut ensemble = Self::new(settings.scorer_timeout(), settings.fallback_probability);
        for artifact in &artifacts.models {
            ensemble.register(
                artifact.id.clone(),
                settings.weight_for(&artifact.id),
                Arc::new(artifact.model.clone()),
            )?;
        }
        Ok(ensemble)
    }

    pub fn register(
        &mut self,
        model_id: impl Into<String>,
        weight: f64,
        scorer: Arc<dyn Scorer>,
    ) -> ClaimsResult<()> {
        let model_id = model_id.into();
        if self.members.iter().any(|m| m.model_id == model_id) {
            return Err(ClaimsError::Config(format!("scorer {model_id} registered twice")));
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(ClaimsError::Config(format!(
                "scorer {model_id} has invalid weight {weight}"
            )));
        }
        debug!(model_id = %model_id, weight, "scorer registered");
        self.members.push(RegisteredScorer {
            model_id,
            weight,
            scorer,
        });
        Ok(())
    }

    pub fn members(&self) -> &[RegisteredScorer] {
        &self.members
    }

    pub fn model_ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.model_id.as_str()).collect()
    }

    pub fn fallback_probability(&self) -> f64 {
        self.fallback_probability
    }

    pub fn fusion_weights(&self) -> FusionWeights {
        let weights: BTreeMap<String, f64> = self
            .members
            .iter()
            .map(|m| (m.model_id.clone(), m.weight))
            .collect();
        FusionWeights::new(weights, 0.0, self.fallback_probability)
    }

    pub async fn score(&self, features: &FeatureVector) -> EnsembleOutcome {
        let runs = self.members.iter().map(|member| async move {
            let result = match tokio::time::timeout(self.timeout, member.scorer.score(features)).await {
                Ok(Ok(p)) if (0.0..=1.0).contains(&p) => Ok(p),
                Ok(Ok(p)) => Err(ScoringError::InvalidProbability(p)),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(ScoringError::Timeout {
                    after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            (member, result)
        });

        let mut outcome = EnsembleOutcome::default();
        for (member, result) in join_all(runs).await {
            match result {
                Ok(probability) => outcome.scores.push(ModelScore {
                    model_id: member.model_id.clone(),
                    probability,
                    source: ScoreSource::Model,
                }),
                Err(error) => {
                    warn!(
                        model_id = %member.model_id,
                        reason = error.reason(),
                        error = %error,
                        fallback = self.fallback_probability,
                        "scorer degraded to fallback probability"
                    );
                    outcome.scores.push(ModelScore {
                        model_id: member.model_id.clone(),
                        probability: self.fallback_probability,
                        source: ScoreSource::Fallback {
                            reason: error.to_string(),
                        },
                    });
                    outcome.degradations.push(Degradation {
                        model_id: member.model_id.clone(),
                        error,
                    });
                }
            }
        }
        outcome
    }
}
