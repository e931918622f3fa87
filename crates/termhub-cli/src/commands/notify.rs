//! Notification CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_core::traits::Clock;
use termhub_core::types::id::{NotificationId, UserId};
use termhub_entity::notification::{ChannelKind, InAppNotification, NotificationPriority};
use termhub_notify::NotificationFormatter;

/// Arguments for notification commands
#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Notification subcommand
    #[command(subcommand)]
    pub command: NotifyCommand,
}

/// Notification subcommands
#[derive(Debug, Subcommand)]
pub enum NotifyCommand {
    /// Send a message to one or more users
    Send {
        /// Recipient user IDs
        #[arg(long = "user", required = true)]
        users: Vec<UserId>,
        /// Title
        #[arg(long)]
        title: String,
        /// Message body
        #[arg(long)]
        message: String,
        /// Priority: low, medium, high, urgent
        #[arg(long, default_value = "low")]
        priority: NotificationPriority,
    },
    /// Show a user's inbox
    Inbox {
        /// User ID
        #[arg(long)]
        user: UserId,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Maximum number of notifications
        #[arg(long, default_value_t = 50)]
        limit: i64,
        /// Mark one notification read
        #[arg(long, conflicts_with = "mark_all_read")]
        mark_read: Option<NotificationId>,
        /// Mark every notification read
        #[arg(long)]
        mark_all_read: bool,
    },
    /// Register where a user is reached on an external channel
    Target {
        /// User ID
        #[arg(long)]
        user: UserId,
        /// Channel: chat or email
        #[arg(long)]
        channel: ChannelKind,
        /// Chat id or email address
        #[arg(long)]
        address: String,
    },
}

/// Notification display row for table output
#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    /// Notification ID
    id: String,
    /// Priority
    priority: String,
    /// Title
    title: String,
    /// Read flag
    read: String,
    /// Created at
    created_at: String,
}

impl From<&InAppNotification> for NotificationRow {
    fn from(n: &InAppNotification) -> Self {
        Self {
            id: n.id.to_string(),
            priority: n.priority.to_string(),
            title: n.title.clone(),
            read: if n.read { "yes" } else { "" }.to_string(),
            created_at: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute notification commands
pub async fn execute(
    args: &NotifyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::connect(config).await?;
    let dispatcher = &services.dispatcher;

    match &args.command {
        NotifyCommand::Send {
            users,
            title,
            message,
            priority,
        } => {
            let Some(&first) = users.first() else {
                return Err(AppError::validation("at least one --user is required"));
            };
            let request = NotificationFormatter::admin_message(first, title, message, *priority);
            let report = dispatcher.send_to_multiple(users, &request).await;
            match format {
                OutputFormat::Json => output::print_json(&report, "{}"),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Sent to {} user(s), {} failed",
                        report.sent, report.failed
                    ));
                    for (user, error) in &report.failures {
                        output::print_warning(&format!("{user}: {error}"));
                    }
                }
            }
        }
        NotifyCommand::Inbox {
            user,
            unread,
            limit,
            mark_read,
            mark_all_read,
        } => {
            if let Some(id) = mark_read {
                dispatcher.mark_read(*id, *user).await?;
                output::print_success(&format!("Notification {id} marked read"));
            }
            if *mark_all_read {
                let count = dispatcher.mark_all_read(*user).await?;
                output::print_success(&format!("{count} notification(s) marked read"));
            }

            let rows: Vec<NotificationRow> = dispatcher
                .list_for_user(*user, *unread, *limit)
                .await?
                .iter()
                .map(Into::into)
                .collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table {
                output::print_kv("Unread", &dispatcher.unread_count(*user).await?.to_string());
            }
        }
        NotifyCommand::Target {
            user,
            channel,
            address,
        } => {
            services
                .directory
                .upsert_target(*user, *channel, address, services.clock.now())
                .await?;
            output::print_success(&format!("{channel} target for {user} set"));
        }
    }

    Ok(())
}
