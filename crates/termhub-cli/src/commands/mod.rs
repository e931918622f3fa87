//! CLI command definitions and dispatch.

pub mod migrate;
pub mod notify;
pub mod sweep;
pub mod template;
pub mod term;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_core::traits::SystemClock;
use termhub_database::DatabasePool;
use termhub_service::{Backends, Services};

/// TermHub: volunteer term lifecycle administration
#[derive(Debug, Parser)]
#[command(name = "termhub", version, about, long_about = None)]
pub struct Cli {
    /// Explicit configuration file, layered over config/default and config/{env}
    #[arg(short, long)]
    pub config: Option<String>,

    /// Configuration environment
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Term template management
    Template(template::TemplateArgs),
    /// Volunteer term operations
    Term(term::TermArgs),
    /// Run a sweep once
    Sweep(sweep::SweepArgs),
    /// Notifications and inboxes
    Notify(notify::NotifyArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env, self.config.as_deref())?;
        tracing::debug!(env = %self.env, explicit = ?self.config, "Configuration loaded");
        match &self.command {
            Commands::Template(args) => template::execute(args, &config, self.format).await,
            Commands::Term(args) => term::execute(args, &config, self.format).await,
            Commands::Sweep(args) => sweep::execute(args, &config, self.format).await,
            Commands::Notify(args) => notify::execute(args, &config, self.format).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
        }
    }
}

/// Helper: connect to PostgreSQL and wire the services
pub async fn connect(config: &AppConfig) -> Result<Services, AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    Services::build(Backends::postgres(&db), config, Arc::new(SystemClock))
}
