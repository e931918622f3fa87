//! Volunteer term CLI commands.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_core::types::id::{TemplateId, TermId, UserId};
use termhub_entity::history::TermHistoryEntry;
use termhub_entity::term::{SignatureType, VolunteerTerm};
use termhub_service::{ActorContext, SignRequest};

/// Arguments for term commands
#[derive(Debug, Args)]
pub struct TermArgs {
    /// Term subcommand
    #[command(subcommand)]
    pub command: TermCommand,
}

/// Term subcommands
#[derive(Debug, Subcommand)]
pub enum TermCommand {
    /// Sign the active template on behalf of a teacher
    Sign {
        /// Teacher user ID
        #[arg(long)]
        teacher: UserId,
        /// Template ID (defaults to the active template)
        #[arg(long)]
        template: Option<TemplateId>,
        /// Signer IP address
        #[arg(long)]
        ip: Option<String>,
        /// Signer device description
        #[arg(long)]
        device: Option<String>,
        /// Signature type: electronic or digital
        #[arg(long, default_value = "electronic")]
        signature_type: SignatureType,
    },
    /// Revoke an active term
    Revoke {
        /// Term ID
        id: TermId,
        /// Reason recorded in the history
        #[arg(long)]
        reason: String,
        /// Revoking user
        #[arg(long)]
        actor: Option<UserId>,
    },
    /// Show a term
    Show {
        /// Term ID
        id: TermId,
    },
    /// List the terms of a teacher
    List {
        /// Teacher user ID
        #[arg(long)]
        teacher: UserId,
    },
    /// Show the history of a term
    History {
        /// Term ID
        id: TermId,
    },
    /// List active terms expiring within the given number of days
    Expiring {
        /// Window in days (defaults to terms.reminder_window_days)
        #[arg(long)]
        days: Option<i64>,
    },
    /// Record that a term was viewed
    View {
        /// Term ID
        id: TermId,
        /// Viewing user
        #[arg(long)]
        actor: Option<UserId>,
    },
}

/// Term display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TermRow {
    /// Term ID
    id: String,
    /// Teacher
    teacher: String,
    /// Status
    status: String,
    /// Signed at
    signed_at: String,
    /// Expires
    expires: String,
    /// Reminded
    reminded: String,
}

impl From<&VolunteerTerm> for TermRow {
    fn from(t: &VolunteerTerm) -> Self {
        Self {
            id: t.id.to_string(),
            teacher: t.teacher_id.to_string(),
            status: t.status.to_string(),
            signed_at: t.signed_at.format("%Y-%m-%d").to_string(),
            expires: t.expiration_date.format("%Y-%m-%d").to_string(),
            reminded: if t.reminder_sent { "yes" } else { "" }.to_string(),
        }
    }
}

/// History display row for table output
#[derive(Debug, Serialize, Tabled)]
struct HistoryRow {
    /// When
    date: String,
    /// Action
    action: String,
    /// Actor
    actor: String,
    /// Details
    details: String,
}

impl From<&TermHistoryEntry> for HistoryRow {
    fn from(e: &TermHistoryEntry) -> Self {
        Self {
            date: e.action_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: e.action_type.to_string(),
            actor: e
                .actor_id
                .map(|a| a.to_string())
                .unwrap_or_else(|| "system".to_string()),
            details: e.details.clone().unwrap_or_default(),
        }
    }
}

/// Execute term commands
pub async fn execute(args: &TermArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let services = super::connect(config).await?;
    let lifecycle = &services.lifecycle;

    match &args.command {
        TermCommand::Sign {
            teacher,
            template,
            ip,
            device,
            signature_type,
        } => {
            let template_id = match template {
                Some(id) => *id,
                None => services.templates.get_active().await?.id,
            };
            let mut ctx = ActorContext::user(*teacher);
            if let Some(ip) = ip {
                ctx = ctx.with_ip(ip);
            }
            if let Some(device) = device {
                ctx = ctx.with_device(device);
            }

            let term = lifecycle
                .sign(SignRequest::new(*teacher, template_id, &ctx, *signature_type))
                .await?;
            output::print_success(&format!(
                "Term {} signed, expires {}",
                term.id,
                term.expiration_date.format("%Y-%m-%d")
            ));
        }
        TermCommand::Revoke { id, reason, actor } => {
            lifecycle.revoke(*id, reason, *actor).await?;
            output::print_success(&format!("Term {id} revoked"));
        }
        TermCommand::Show { id } => {
            let term = lifecycle.get_term(*id).await?;
            let valid = term.is_valid_at(Utc::now());
            output::print_record(
                &[
                    ("ID", term.id.to_string()),
                    ("Teacher", term.teacher_id.to_string()),
                    ("Template", term.template_id.to_string()),
                    ("Status", term.status.to_string()),
                    ("Valid now", valid.to_string()),
                    ("Signed at", term.signed_at.to_rfc3339()),
                    ("Expires", term.expiration_date.to_rfc3339()),
                    ("Reminder sent", term.reminder_sent.to_string()),
                    ("Signature", term.signature_type.to_string()),
                    ("IP address", output::or_dash(term.ip_address.as_deref())),
                    ("Device", output::or_dash(term.device_info.as_deref())),
                ],
                &term,
                format,
            );
        }
        TermCommand::List { teacher } => {
            let rows: Vec<TermRow> = lifecycle
                .list_for_teacher(*teacher)
                .await?
                .iter()
                .map(Into::into)
                .collect();
            output::print_list(&rows, format);
        }
        TermCommand::History { id } => {
            let rows: Vec<HistoryRow> = lifecycle.history(*id).await?.iter().map(Into::into).collect();
            output::print_list(&rows, format);
        }
        TermCommand::Expiring { days } => {
            let days = days.unwrap_or(config.terms.reminder_window_days);
            let limit = Utc::now() + Duration::days(days);
            let rows: Vec<TermRow> = lifecycle
                .get_expiring(limit)
                .await?
                .iter()
                .map(Into::into)
                .collect();
            output::print_list(&rows, format);
        }
        TermCommand::View { id, actor } => {
            let entry = lifecycle.record_view(*id, *actor).await?;
            output::print_success(&format!(
                "View of term {id} recorded at {}",
                entry.action_date.to_rfc3339()
            ));
        }
    }

    Ok(())
}
