//! TermHub daemon: volunteer term sweeps on a schedule.
//!
//! Wires storage, services and the cron scheduler together, then waits
//! for a shutdown signal.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use termhub_core::config::{AppConfig, StorageBackend};
use termhub_core::error::AppError;
use termhub_core::traits::{Clock, SystemClock};
use termhub_database::{DatabasePool, MemoryStore};
use termhub_service::{Backends, Services};
use termhub_worker::jobs::{ExpireSweepJobHandler, ReminderSweepJobHandler};
use termhub_worker::{CronScheduler, JobExecutor};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from config/ and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TERMHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let explicit = std::env::var("TERMHUB_CONFIG").ok();
    AppConfig::load(&env, explicit.as_deref())
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TermHub v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (backends, db) = match config.worker.storage {
        StorageBackend::Postgres => {
            let db = DatabasePool::connect_and_migrate(&config.database).await?;
            (Backends::postgres(&db), Some(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; nothing survives a restart");
            (Backends::memory(MemoryStore::new()), None)
        }
    };

    let services = Services::build(backends, &config, Arc::clone(&clock))?;
    tracing::info!(
        validity_months = config.terms.validity_months,
        reminder_window_days = config.terms.reminder_window_days,
        "Services initialized"
    );

    let scheduler = if config.worker.enabled {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ExpireSweepJobHandler::new(
            Arc::clone(&services.lifecycle),
            Arc::clone(&clock),
        )));
        executor.register(Arc::new(ReminderSweepJobHandler::new(
            Arc::clone(&services.lifecycle),
            Arc::clone(&clock),
        )));

        let scheduler = CronScheduler::new(Arc::new(executor), Arc::clone(&clock)).await?;
        scheduler.register_sweeps(&config.worker).await?;
        scheduler.start().await?;
        tracing::info!("Sweep scheduler started");
        Some(scheduler)
    } else {
        tracing::info!("Sweep scheduler disabled");
        None
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    if let Some(mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }
    if let Some(db) = db {
        db.close().await;
    }

    tracing::info!("TermHub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
