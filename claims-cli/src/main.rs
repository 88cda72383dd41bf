use anyhow::Result;
use chrono::NaiveDate;
use claims_engine::ClaimValidationService;
use clap::{Parser, Subcommand};
use logger_redacted::{init_tracing, LoggerConfig};
use std::path::PathBuf;

mod commands;
mod io;

#[derive(Parser, Debug)]
#[command(
    name = "claimguard",
    version,
    about = "Validate medical insurance claims and report on past decisions"
)]
struct Args {
    /// Engine configuration file (YAML, TOML or JSON)
    #[arg(short, long, global = true, env = "CLAIMGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one claim submission (JSON document, `-` for stdin)
    Validate {
        claim: PathBuf,

        /// Do not record the claim in history
        #[arg(long)]
        dry_run: bool,

        /// Print the plain-language explanation alongside the decision
        #[arg(long)]
        explain: bool,
    },
    /// Validate newline-delimited claim submissions in order
    Batch {
        input: PathBuf,

        /// Output file for decisions, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },
    /// Summarize stored decisions
    Report {
        decisions: PathBuf,

        /// Last day of the trend series (YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,

        /// Length of the trend series, overriding the configured value
        #[arg(long)]
        trend_days: Option<u32>,
    },
    /// Explain a stored decision
    Explain {
        decision: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logger = LoggerConfig {
        json: args.json_logs,
        stderr: true,
        ..LoggerConfig::default()
    }
    .verbose(args.verbose);
    init_tracing(&logger)?;

    let config = commands::load_config(args.config.as_deref())?;

    match args.command {
        Command::Validate {
            claim,
            dry_run,
            explain,
        } => {
            let service = ClaimValidationService::new(config)?;
            let record =
                commands::validate(&service, &claim, commands::history_mode(dry_run)).await?;
            if explain {
                let explanation = service.explain(&record);
                let output = serde_json::json!({ "decision": record, "explanation": explanation });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Command::Batch {
            input,
            output,
            dry_run,
        } => {
            let service = ClaimValidationService::new(config)?;
            let tally = commands::batch(
                &service,
                &input,
                output.as_deref(),
                commands::history_mode(dry_run),
            )
            .await?;
            eprintln!(
                "{} claims: {} approved, {} rejected, {} manual review, {} rejected at intake, {} unreadable",
                tally.total(),
                tally.approved,
                tally.rejected,
                tally.manual_review,
                tally.intake_rejected,
                tally.unreadable
            );
        }
        Command::Report {
            decisions,
            as_of,
            trend_days,
        } => {
            let window = commands::summary_window(&config, as_of, trend_days);
            let summary = commands::report(&decisions, &window)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Explain { decision, json } => {
            let explanation = commands::explain_stored(&decision)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&explanation)?);
            } else {
                println!("{}", commands::render_explanation(&explanation));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "claimguard",
            "batch",
            "claims.jsonl",
            "-o",
            "out.jsonl",
            "--dry-run",
            "--config",
            "engine.yaml",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("engine.yaml")));
        match args.command {
            Command::Batch { output, dry_run, .. } => {
                assert_eq!(output, Some(PathBuf::from("out.jsonl")));
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn report_requires_a_valid_date() {
        assert!(Args::try_parse_from(["claimguard", "report", "d.jsonl", "--as-of", "15/01/2024"]).is_err());

        let args =
            Args::try_parse_from(["claimguard", "report", "d.jsonl", "--as-of", "2024-01-15"]).unwrap();
        match args.command {
            Command::Report { as_of, trend_days, .. } => {
                assert_eq!(as_of, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
                assert_eq!(trend_days, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
