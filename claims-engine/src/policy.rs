use crate::config::PolicySettings;
use crate::models::{Disposition, FusedScore, RuleOutcome};

/// Maps rule outcomes and the fused score to a disposition
///
/// Evaluated top to bottom:
///
/// | condition                               | disposition   |
/// |-----------------------------------------|---------------|
/// | any critical rule failed                | Rejected      |
/// | score >= reject threshold               | Rejected      |
/// | score >= review threshold               | Manual Review |
/// | any warning rule failed                 | Manual Review |
/// | otherwise                               | Approved      |
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    review_threshold: f64,
    reject_threshold: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(&PolicySettings::default())
    }
}

impl DecisionPolicy {
    pub fn new(settings: &PolicySettings) -> Self {
        Self {
            review_threshold: settings.review_threshold,
            reject_threshold: settings.reject_threshold,
        }
    }

    pub fn decide(&self, outcomes: &[RuleOutcome], score: FusedScore) -> Disposition {
        let score = score.value();
        if outcomes.iter().any(RuleOutcome::is_critical_failure) || score >= self.reject_threshold {
            Disposition::Rejected
        } else if score >= self.review_threshold || outcomes.iter().any(RuleOutcome::is_warning_failure) {
            Disposition::ManualReview
        } else {
            Disposition::Approved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RuleId, ViolationCode};
    use proptest::prelude::*;

    fn all_pass() -> Vec<RuleOutcome> {
        RuleId::ALL.iter().map(|r| RuleOutcome::pass(*r, "ok")).collect()
    }

    fn failing(rule: RuleId) -> Vec<RuleOutcome> {
        RuleId::ALL
            .iter()
            .map(|r| {
                if *r == rule {
                    RuleOutcome::fail(*r, ViolationCode::CostOutOfRange, "bad")
                } else {
                    RuleOutcome::pass(*r, "ok")
                }
            })
            .collect()
    }

    #[test]
    fn thresholds() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(&all_pass(), FusedScore::new(0.59)), Disposition::Approved);
        assert_eq!(policy.decide(&all_pass(), FusedScore::new(0.6)), Disposition::ManualReview);
        assert_eq!(policy.decide(&all_pass(), FusedScore::new(0.79)), Disposition::ManualReview);
        assert_eq!(policy.decide(&all_pass(), FusedScore::new(0.8)), Disposition::Rejected);
    }

    #[test]
    fn critical_failure_overrides_low_score() {
        let policy = DecisionPolicy::default();
        assert_eq!(
            policy.decide(&failing(RuleId::CoverageLimit), FusedScore::new(0.0)),
            Disposition::Rejected
        );
    }

    #[test]
    fn warning_failure_escalates_to_review() {
        let policy = DecisionPolicy::default();
        assert_eq!(
            policy.decide(&failing(RuleId::CostRange), FusedScore::new(0.1)),
            Disposition::ManualReview
        );
        assert_eq!(
            policy.decide(&failing(RuleId::AgeSpecific), FusedScore::new(0.9)),
            Disposition::Rejected
        );
    }

    proptest! {
        #[test]
        fn critical_failure_always_rejects(
            rule_index in 0usize..6,
            score in 0.0f64..=1.0,
        ) {
            let rule = RuleId::ALL[rule_index];
            let disposition = DecisionPolicy::default().decide(&failing(rule), FusedScore::new(score));
            if rule.severity() == crate::models::Severity::Critical {
                prop_assert_eq!(disposition, Disposition::Rejected);
            } else {
                prop_assert_ne!(disposition, Disposition::Approved);
            }
        }
    }
}
