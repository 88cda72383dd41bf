use crate::models::{DecisionRecord, Disposition, FusedScore, RuleId, Severity, ViolationCode};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Band for a whole-number risk percentage
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=10 => Self::VeryLow,
            11..=25 => Self::Low,
            26..=50 => Self::Moderate,
            51..=75 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::VeryLow => "The claim shows minimal fraud indicators.",
            Self::Low => "The claim looks standard with no major concerns.",
            Self::Moderate => "Some factors in the claim call for review.",
            Self::High => "The claim contains patterns that warrant closer examination.",
            Self::VeryHigh => "The claim presents significant risk factors requiring investigation.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationNote {
    pub code: ViolationCode,
    pub rule: RuleId,
    pub severity: Severity,
    pub summary: &'static str,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelContribution {
    pub model_id: String,
    pub percent: u8,
    pub fallback: bool,
}

/// Plain-language account of a decision for claimants and adjusters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionExplanation {
    pub claim_id: String,
    pub disposition: Disposition,
    pub headline: String,
    pub violations: Vec<ViolationNote>,
    pub risk_percent: u8,
    pub risk_level: RiskLevel,
    pub risk_summary: String,
    pub models: Vec<ModelContribution>,
    pub next_steps: Vec<String>,
}

fn violation_summary(code: ViolationCode) -> &'static str {
    match code {
        ViolationCode::CostExceedsLimit => "Claimed amount exceeds the coverage limit for this service.",
        ViolationCode::InvalidDiagnosis => "Diagnosis code is not recognized.",
        ViolationCode::MismatchDiagnosisProcedure => "The procedure does not match the diagnosis.",
        ViolationCode::CostOutOfRange => "Claimed amount is outside the usual range for this procedure.",
        ViolationCode::AgeRestriction => "This treatment is restricted for the patient's age group.",
        ViolationCode::DuplicateClaim => "This claim appears to duplicate a recent submission.",
        ViolationCode::CostToCoverageRatio => "The cost uses an unusually large share of the coverage limit.",
    }
}

fn correction_for(code: ViolationCode) -> &'static str {
    match code {
        ViolationCode::CostExceedsLimit => {
            "Reduce the billed amount to the coverage limit or attach proof of extended coverage."
        }
        ViolationCode::InvalidDiagnosis | ViolationCode::MismatchDiagnosisProcedure => {
            "Verify the diagnosis and procedure codes against the medical record."
        }
        ViolationCode::CostOutOfRange => "Attach an itemized bill supporting the claimed amount.",
        ViolationCode::AgeRestriction => {
            "Attach clinical documentation supporting treatment at the patient's age."
        }
        ViolationCode::DuplicateClaim => {
            "Confirm this is a separate service; reference the earlier claim if it is a correction."
        }
        ViolationCode::CostToCoverageRatio => "Attach documentation justifying the treatment cost.",
    }
}

pub fn explain(record: &DecisionRecord) -> DecisionExplanation {
    let risk_percent = record.fused_score().percent();
    let risk_level = RiskLevel::from_percent(risk_percent);

    let violations: Vec<ViolationNote> = record
        .failed_rules()
        .filter_map(|outcome| {
            outcome.violation.map(|code| ViolationNote {
                code,
                rule: outcome.rule,
                severity: outcome.severity,
                summary: violation_summary(code),
                detail: outcome.reason.clone(),
            })
        })
        .collect();

    let headline = match record.disposition() {
        Disposition::Approved => format!("Claim {} has been approved for processing.", record.claim_id()),
        Disposition::Rejected => format!(
            "Claim {} has been rejected and needs corrections before resubmission.",
            record.claim_id()
        ),
        Disposition::ManualReview => {
            format!("Claim {} is held for manual review by an adjuster.", record.claim_id())
        }
    };

    let risk_summary = format!(
        "Fraud risk {risk_percent}/100 ({}). {} The score compares this claim with typical billing \
         patterns; it is not a finding of fraud.",
        risk_level.label(),
        risk_level.description()
    );

    let models = record
        .model_scores()
        .iter()
        .map(|score| ModelContribution {
            model_id: score.model_id.clone(),
            percent: FusedScore::new(score.probability).percent(),
            fallback: score.is_fallback(),
        })
        .collect();

    let next_steps = next_steps(record.disposition(), &violations);

    DecisionExplanation {
        claim_id: record.claim_id().to_string(),
        disposition: record.disposition(),
        headline,
        violations,
        risk_percent,
        risk_level,
        risk_summary,
        models,
        next_steps,
    }
}

fn next_steps(disposition: Disposition, violations: &[ViolationNote]) -> Vec<String> {
    match disposition {
        Disposition::Approved => {
            vec!["No action required. The claim will be processed for payment.".to_string()]
        }
        Disposition::ManualReview if violations.is_empty() => vec![
            "No action required now. The claim's risk score calls for an adjuster's review.".to_string(),
            "A notification follows once the review is complete.".to_string(),
        ],
        Disposition::ManualReview | Disposition::Rejected => {
            let mut steps: Vec<String> = Vec::new();
            for note in violations {
                let step = correction_for(note.code).to_string();
                if !steps.contains(&step) {
                    steps.push(step);
                }
            }
            if disposition == Disposition::Rejected {
                steps.push("Resubmit the corrected claim.".to_string());
            } else {
                steps.push("Supporting documents may shorten the review.".to_string());
            }
            steps
        }
    }
}
