//! Cron scheduler for the periodic sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};

use termhub_core::config::WorkerConfig;
use termhub_core::error::AppError;
use termhub_core::traits::Clock;

use crate::executor::{JobExecutor, JobRun};
use crate::jobs::{EXPIRE_SWEEP, REMINDER_SWEEP};

/// Cron-based scheduler that triggers sweep runs on the executor
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
            clock,
        })
    }

    /// Register both sweeps with the schedules from `config`
    pub async fn register_sweeps(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register(EXPIRE_SWEEP, &config.expire_cron).await?;
        self.register(REMINDER_SWEEP, &config.reminder_cron).await?;
        info!("All scheduled sweeps registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Cron scheduler shut down");
        Ok(())
    }

    async fn register(&self, job_type: &'static str, schedule: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{job_type}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let clock = Arc::clone(&self.clock);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let clock = Arc::clone(&clock);
            Box::pin(async move {
                let run = JobRun::new(job_type, clock.now());
                if let Err(e) = executor.execute(&run).await {
                    error!(run_id = %run.id, job_type, error = %e, "Scheduled job failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid schedule '{schedule}' for {job_type}: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {job_type} schedule: {e}")))?;

        info!(job_type, schedule, "Registered scheduled job");
        Ok(())
    }
}
