//! One-off sweep commands.
//!
//! The daemon runs the same sweeps on a schedule; these are for catching
//! up by hand.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_core::types::id::UserId;

/// Arguments for sweep commands
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Sweep subcommand
    #[command(subcommand)]
    pub command: SweepCommand,
}

/// Sweep subcommands
#[derive(Debug, Subcommand)]
pub enum SweepCommand {
    /// Expire active terms past their expiration date
    Expire,
    /// Send reminders for terms expiring soon
    Remind {
        /// Window in days (defaults to terms.reminder_window_days)
        #[arg(long)]
        days: Option<i64>,
        /// User recorded as the reminder's actor
        #[arg(long)]
        actor: Option<UserId>,
    },
}

/// Execute sweep commands
pub async fn execute(args: &SweepArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let services = super::connect(config).await?;
    let lifecycle = &services.lifecycle;

    match &args.command {
        SweepCommand::Expire => {
            let report = lifecycle.expire_sweep(Utc::now()).await?;
            match format {
                OutputFormat::Json => output::print_json(&report, "{}"),
                OutputFormat::Table => {
                    output::print_success(&format!("{} term(s) expired", report.transitioned));
                    for failure in &report.failures {
                        output::print_warning(&format!("{}: {}", failure.term_id, failure.error));
                    }
                }
            }
        }
        SweepCommand::Remind { days, actor } => {
            let now = Utc::now();
            let limit = match days {
                Some(days) => now + Duration::days(*days),
                None => lifecycle.reminder_limit(now),
            };
            let report = lifecycle.reminder_sweep(limit, *actor).await?;
            match format {
                OutputFormat::Json => output::print_json(&report, "{}"),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "{} reminder(s) sent, {} failed, {} skipped",
                        report.sent, report.failed, report.skipped
                    ));
                    for failure in &report.failures {
                        output::print_warning(&format!("{}: {}", failure.term_id, failure.error));
                    }
                }
            }
        }
    }

    Ok(())
}
