//! Reminder sweep job.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use termhub_core::traits::Clock;
use termhub_service::TermLifecycleManager;

use super::REMINDER_SWEEP;
use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Reminds teachers whose term expires within the reminder window.
#[derive(Debug)]
pub struct ReminderSweepJobHandler {
    manager: Arc<TermLifecycleManager>,
    clock: Arc<dyn Clock>,
}

impl ReminderSweepJobHandler {
    /// Create a new reminder sweep handler
    pub fn new(manager: Arc<TermLifecycleManager>, clock: Arc<dyn Clock>) -> Self {
        Self { manager, clock }
    }
}

#[async_trait]
impl JobHandler for ReminderSweepJobHandler {
    fn job_type(&self) -> &str {
        REMINDER_SWEEP
    }

    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError> {
        let limit = self.manager.reminder_limit(self.clock.now());
        let report = self
            .manager
            .reminder_sweep(limit, None)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Reminder sweep failed: {e}")))?;

        if report.failed > 0 {
            warn!(run_id = %run.id, failed = report.failed, "Some reminders were not delivered");
        }

        Ok(serde_json::json!({
            "task": REMINDER_SWEEP,
            "limit": limit,
            "sent": report.sent,
            "failed": report.failed,
            "skipped": report.skipped,
            "failures": report.failures,
        }))
    }
}
