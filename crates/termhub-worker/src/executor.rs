//! Job executor: dispatches runs to registered handlers.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use termhub_core::error::AppError;

/// One triggered execution of a job type.
#[derive(Debug, Clone)]
pub struct JobRun {
    /// Identifier used to correlate log lines.
    pub id: Uuid,
    /// Handler key.
    pub job_type: String,
    /// When the trigger fired.
    pub triggered_at: DateTime<Utc>,
}

impl JobRun {
    /// Create a run for `job_type` triggered at `triggered_at`.
    pub fn new(job_type: impl Into<String>, triggered_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            job_type: job_type.into(),
            triggered_at,
        }
    }
}

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job type this handler processes
    fn job_type(&self) -> &str;

    /// Execute the job, returning a JSON summary
    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, retrying will not help
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, the next trigger may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches runs to the handler registered for their job type.
///
/// At most one run per job type is in flight; a trigger that arrives while
/// one is running is skipped.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    running: Arc<Mutex<HashSet<String>>>,
}

/// Clears the in-flight mark when the run ends, even on panic.
struct InFlight {
    running: Arc<Mutex<HashSet<String>>>,
    job_type: String,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.job_type);
    }
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Execute a run.
    ///
    /// Returns `Ok(None)` when a run of the same type is still in flight.
    pub async fn execute(&self, run: &JobRun) -> Result<Option<Value>, JobExecutionError> {
        let handler = self.handlers.get(&run.job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{}'",
                run.job_type
            ))
        })?;

        let Some(_guard) = self.begin(&run.job_type) else {
            warn!(run_id = %run.id, job_type = %run.job_type, "Previous run still in flight, skipping");
            return Ok(None);
        };

        info!(run_id = %run.id, job_type = %run.job_type, "Executing job");
        let summary = handler.execute(run).await?;
        info!(run_id = %run.id, job_type = %run.job_type, summary = %summary, "Job finished");
        Ok(Some(summary))
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get the list of registered job types
    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    fn begin(&self, job_type: &str) -> Option<InFlight> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if !running.insert(job_type.to_string()) {
            return None;
        }
        Some(InFlight {
            running: Arc::clone(&self.running),
            job_type: job_type.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Debug)]
    struct BlockingHandler {
        release: Arc<Notify>,
        started: Arc<Notify>,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for BlockingHandler {
        fn job_type(&self) -> &str {
            "blocking"
        }

        async fn execute(&self, _run: &JobRun) -> Result<Value, JobExecutionError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            Ok(serde_json::json!({ "ok": true }))
        }
    }

    #[tokio::test]
    async fn test_unknown_job_type_is_permanent() {
        let executor = JobExecutor::new();
        let err = executor
            .execute(&JobRun::new("missing", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let release = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        let handler = Arc::new(BlockingHandler {
            release: Arc::clone(&release),
            started: Arc::clone(&started),
            runs: AtomicUsize::new(0),
        });
        let mut executor = JobExecutor::new();
        executor.register(handler.clone());
        let executor = Arc::new(executor);

        let first = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.execute(&JobRun::new("blocking", Utc::now())).await })
        };
        started.notified().await;

        let skipped = executor
            .execute(&JobRun::new("blocking", Utc::now()))
            .await
            .unwrap();
        assert!(skipped.is_none());

        release.notify_one();
        let summary = first.await.unwrap().unwrap();
        assert_eq!(summary, Some(serde_json::json!({ "ok": true })));
        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);

        // The in-flight mark is cleared once the run ends.
        let again = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.execute(&JobRun::new("blocking", Utc::now())).await })
        };
        started.notified().await;
        release.notify_one();
        assert!(again.await.unwrap().unwrap().is_some());
    }
}
