use crate::io;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use claims_engine::{
    explain, ClaimSubmission, ClaimValidationService, ClaimsError, DecisionExplanation,
    DecisionRecord, DecisionSummary, Disposition, EngineConfig, FieldViolation, HistoryMode,
    SummaryWindow,
};
use colored::Colorize;
use config_engine::{ConfigLoader, ConfigSource};
use error_common::{log_error, ClaimGuardError, ErrorContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "claimguard.yaml";

/// Log a failure under its stable error code and hand it back for `?`
pub fn report_failure(err: impl Into<ClaimGuardError>, context: &ErrorContext) -> anyhow::Error {
    let err = err.into();
    log_error(context, &err);
    err.into()
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let file = match path {
        Some(path) => ConfigSource::file(path),
        None => ConfigSource::optional_file(DEFAULT_CONFIG_FILE),
    };
    ConfigLoader::new()
        .add_source(file)
        .add_source(ConfigSource::env())
        .load::<EngineConfig>()
        .map_err(|e| report_failure(e, &ErrorContext::new().with_operation("load_config")))
}

pub fn history_mode(dry_run: bool) -> HistoryMode {
    if dry_run {
        HistoryMode::DryRun
    } else {
        HistoryMode::Record
    }
}

pub async fn validate(
    service: &ClaimValidationService,
    claim: &Path,
    mode: HistoryMode,
) -> Result<DecisionRecord> {
    let submission: ClaimSubmission = io::read_document(claim)?;
    let context = ErrorContext::new()
        .with_claim_id(submission.claim_id.trim())
        .with_operation("validate");
    service
        .submit_with_mode(submission, mode)
        .await
        .map_err(|e| report_failure(e, &context))
}

/// One line of batch output
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Decided {
        line: usize,
        decision: DecisionRecord,
    },
    IntakeRejected {
        line: usize,
        violations: Vec<FieldViolation>,
    },
    Unreadable {
        line: usize,
        error: String,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub approved: usize,
    pub rejected: usize,
    pub manual_review: usize,
    pub intake_rejected: usize,
    pub unreadable: usize,
}

impl BatchTally {
    fn count(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Approved => self.approved += 1,
            Disposition::Rejected => self.rejected += 1,
            Disposition::ManualReview => self.manual_review += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.approved + self.rejected + self.manual_review + self.intake_rejected + self.unreadable
    }
}

/// Validate newline-delimited submissions in file order
///
/// Each input line yields exactly one output line. Claims earlier in the
/// file are history for the ones after them.
pub async fn batch(
    service: &ClaimValidationService,
    input: &Path,
    output: Option<&Path>,
    mode: HistoryMode,
) -> Result<BatchTally> {
    let items = io::read_json_lines::<ClaimSubmission>(io::open_input(input)?)?;
    let mut out = io::open_output(output)?;
    let mut tally = BatchTally::default();

    for (line, parsed) in items {
        let entry = match parsed {
            Err(e) => {
                tally.unreadable += 1;
                let error = service.redactor().redact(&e.to_string());
                warn!(line, error = %error, "unreadable claim line");
                BatchEntry::Unreadable { line, error }
            }
            Ok(submission) => {
                let claim_id = submission.claim_id.trim().to_string();
                match service.submit_with_mode(submission, mode).await {
                Ok(decision) => {
                    tally.count(decision.disposition());
                    BatchEntry::Decided { line, decision }
                }
                Err(ClaimsError::Intake(violations)) => {
                    tally.intake_rejected += 1;
                    BatchEntry::IntakeRejected { line, violations }
                }
                Err(other) => {
                    let context = ErrorContext::new()
                        .with_claim_id(claim_id)
                        .with_operation("batch")
                        .add_context("line", line.to_string());
                    return Err(report_failure(other, &context));
                }
                }
            }
        };
        io::write_json_line(&mut out, &entry)?;
    }
    out.flush()?;

    info!(
        total = tally.total(),
        approved = tally.approved,
        rejected = tally.rejected,
        manual_review = tally.manual_review,
        intake_rejected = tally.intake_rejected,
        unreadable = tally.unreadable,
        "batch complete"
    );
    Ok(tally)
}

/// A decision as stored by `validate`, or as a line of `batch` output
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredDecision {
    Bare(DecisionRecord),
    Batch { decision: Option<DecisionRecord> },
}

pub fn summary_window(config: &EngineConfig, as_of: NaiveDate, trend_days: Option<u32>) -> SummaryWindow {
    SummaryWindow {
        as_of,
        trend_days: trend_days.unwrap_or(config.reporting.trend_days),
        fraud_flag_threshold: config.reporting.fraud_flag_threshold,
    }
}

pub fn report(decisions: &Path, window: &SummaryWindow) -> Result<DecisionSummary> {
    let mut records = Vec::new();
    for (line, parsed) in io::read_json_lines::<StoredDecision>(io::open_input(decisions)?)? {
        match parsed.with_context(|| format!("line {line} is not a decision record"))? {
            StoredDecision::Bare(record) | StoredDecision::Batch { decision: Some(record) } => {
                records.push(record);
            }
            StoredDecision::Batch { decision: None } => {
                debug!(line, "skipping entry without a decision");
            }
        }
    }
    Ok(DecisionSummary::from_records(&records, window))
}

pub fn explain_stored(decision: &Path) -> Result<DecisionExplanation> {
    match io::read_document::<StoredDecision>(decision)? {
        StoredDecision::Bare(record) | StoredDecision::Batch { decision: Some(record) } => {
            Ok(explain(&record))
        }
        StoredDecision::Batch { decision: None } => {
            anyhow::bail!("{} holds no decision", decision.display())
        }
    }
}

/// Human-readable rendering of an explanation
pub fn render_explanation(explanation: &DecisionExplanation) -> String {
    let headline = match explanation.disposition {
        Disposition::Approved => explanation.headline.green().bold(),
        Disposition::Rejected => explanation.headline.red().bold(),
        Disposition::ManualReview => explanation.headline.yellow().bold(),
    };
    let mut lines = vec![headline.to_string(), String::new()];

    if !explanation.violations.is_empty() {
        lines.push("Issues found:".bold().to_string());
        for note in &explanation.violations {
            lines.push(format!("  [{}] {}", note.code.as_str(), note.summary));
            lines.push(format!("      {}", note.detail.dimmed()));
        }
        lines.push(String::new());
    }

    lines.push(explanation.risk_summary.clone());
    for model in &explanation.models {
        let marker = if model.fallback { " (fallback)" } else { "" };
        lines.push(format!("  {:<10} {:>3}%{}", model.model_id, model.percent, marker));
    }
    lines.push(String::new());

    lines.push("Next steps:".bold().to_string());
    for (n, step) in explanation.next_steps.iter().enumerate() {
        lines.push(format!("  {}. {}", n + 1, step));
    }
    lines.join("\n")
}
