use crate::config::RuleSettings;
use crate::history::{HistoryIndex, HistoryMode};
use crate::models::{ClaimRecord, RuleId, RuleOutcome, ViolationCode};
use crate::tables::{CompiledTables, ReferenceTables};
use tracing::debug;

/// Deterministic compliance checks
///
/// `evaluate` always returns one outcome per [`RuleId`], in
/// [`RuleId::ALL`] order. A failing rule never short-circuits the rest.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    settings: RuleSettings,
    tables: CompiledTables,
}

impl RuleEvaluator {
    pub fn new(settings: RuleSettings, tables: &ReferenceTables) -> Self {
        Self {
            settings,
            tables: tables.compile(),
        }
    }

    pub fn evaluate(
        &self,
        claim: &ClaimRecord,
        history: &HistoryIndex,
        mode: HistoryMode,
    ) -> Vec<RuleOutcome> {
        let outcomes: Vec<RuleOutcome> = RuleId::ALL
            .iter()
            .map(|rule| match rule {
                RuleId::CoverageLimit => self.coverage_limit(claim),
                RuleId::DiagnosisProcedureMapping => self.diagnosis_procedure(claim),
                RuleId::CostRange => self.cost_range(claim),
                RuleId::AgeSpecific => self.age_specific(claim),
                RuleId::DuplicateDetection => self.duplicate(claim, history, mode),
                RuleId::PatternAnalysis => self.pattern(claim),
            })
            .collect();

        debug!(
            claim_id = %claim.claim_id,
            failed = outcomes.iter().filter(|o| !o.passed).count(),
            "rules evaluated"
        );
        outcomes
    }

    fn coverage_limit(&self, claim: &ClaimRecord) -> RuleOutcome {
        let rule = RuleId::CoverageLimit;
        if claim.treatment_cost > claim.insurance_coverage_limit {
            RuleOutcome::fail(
                rule,
                ViolationCode::CostExceedsLimit,
                format!(
                    "Treatment cost ${:.2} exceeds coverage limit ${:.2}",
                    claim.treatment_cost, claim.insurance_coverage_limit
                ),
            )
        } else {
            RuleOutcome::pass(rule, "Treatment cost is within the coverage limit")
        }
    }

    fn diagnosis_procedure(&self, claim: &ClaimRecord) -> RuleOutcome {
        let rule = RuleId::DiagnosisProcedureMapping;
        match self.tables.mappings.get(&claim.diagnosis_code) {
            None => RuleOutcome::fail(
                rule,
                ViolationCode::InvalidDiagnosis,
                format!("Diagnosis code {} is not recognised", claim.diagnosis_code),
            ),
            Some(procedures) if !procedures.contains(&claim.procedure_code) => RuleOutcome::fail(
                rule,
                ViolationCode::MismatchDiagnosisProcedure,
                format!(
                    "Procedure {} is not permitted for diagnosis {}",
                    claim.procedure_code, claim.diagnosis_code
                ),
            ),
            Some(_) => RuleOutcome::pass(rule, "Procedure is permitted for the diagnosis"),
        }
    }

    fn cost_range(&self, claim: &ClaimRecord) -> RuleOutcome {
        let rule = RuleId::CostRange;
        let band = self.tables.band_for(&claim.procedure_code);
        if band.contains(claim.treatment_cost) {
            RuleOutcome::pass(rule, "Cost is within the expected range for the procedure")
        } else {
            RuleOutcome::fail(
                rule,
                ViolationCode::CostOutOfRange,
                format!(
                    "Cost ${:.2} is outside the expected range ${}-${} for procedure {}",
                    claim.treatment_cost,
                    band.min,
                    band.max,
                    claim.procedure_code
                ),
            )
        }
    }

    fn age_specific(&self, claim: &ClaimRecord) -> RuleOutcome {
        let rule = RuleId::AgeSpecific;
        let matched: Vec<&str> = self
            .tables
            .age_conditions
            .iter()
            .filter(|c| c.matches(claim))
            .map(|c| c.name.as_str())
            .collect();
        if matched.is_empty() {
            RuleOutcome::pass(rule, "No age restriction applies")
        } else {
            RuleOutcome::fail(
                rule,
                ViolationCode::AgeRestriction,
                format!("Patient age {} is restricted: {}", claim.age, matched.join("; ")),
            )
        }
    }

    fn duplicate(&self, claim: &ClaimRecord, history: &HistoryIndex, mode: HistoryMode) -> RuleOutcome {
        let rule = RuleId::DuplicateDetection;
        let check = history.check_and_append(claim, self.settings.duplicate_window_days, mode);
        if check.is_duplicate() {
            let ids: Vec<&str> = check.conflicts.iter().map(|c| c.claim_id.as_str()).collect();
            RuleOutcome::fail(
                rule,
                ViolationCode::DuplicateClaim,
                format!(
                    "Same patient and procedure already claimed within {} day(s): {}",
                    self.settings.duplicate_window_days,
                    ids.join(", ")
                ),
            )
        } else {
            RuleOutcome::pass(rule, "No prior claim for this patient and procedure in the window")
        }
    }

    fn pattern(&self, claim: &ClaimRecord) -> RuleOutcome {
        let rule = RuleId::PatternAnalysis;
        let ratio = claim.cost_coverage_ratio(self.settings.ratio_epsilon);
        if ratio > self.settings.cost_coverage_ratio_threshold {
            RuleOutcome::fail(
                rule,
                ViolationCode::CostToCoverageRatio,
                format!(
                    "Cost is {:.0}% of the coverage limit (threshold {:.0}%)",
                    ratio * 100.0,
                    self.settings.cost_coverage_ratio_threshold * 100.0
                ),
            )
        } else {
            RuleOutcome::pass(rule, "Cost-to-coverage ratio is typical")
        }
    }
}
