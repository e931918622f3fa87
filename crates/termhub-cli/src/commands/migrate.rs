//! Schema migration commands.

use clap::{Args, Subcommand};

use crate::output;
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_database::{DatabasePool, migration};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// List the migrations built into this binary
    List,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            let db = DatabasePool::connect(&config.database).await?;
            let result = migration::run_migrations(db.pool()).await;
            db.close().await;
            result?;
            output::print_success("Schema is up to date");
        }
        MigrateCommand::List => {
            for (version, description) in migration::embedded_migrations() {
                output::print_kv(&version.to_string(), &description);
            }
        }
    }
    Ok(())
}
