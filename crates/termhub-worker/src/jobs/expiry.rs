//! Expiry sweep job.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use termhub_core::traits::Clock;
use termhub_service::TermLifecycleManager;

use super::EXPIRE_SWEEP;
use crate::executor::{JobExecutionError, JobHandler, JobRun};

/// Moves active terms past their expiration date to `expired`.
#[derive(Debug)]
pub struct ExpireSweepJobHandler {
    manager: Arc<TermLifecycleManager>,
    clock: Arc<dyn Clock>,
}

impl ExpireSweepJobHandler {
    /// Create a new expiry sweep handler
    pub fn new(manager: Arc<TermLifecycleManager>, clock: Arc<dyn Clock>) -> Self {
        Self { manager, clock }
    }
}

#[async_trait]
impl JobHandler for ExpireSweepJobHandler {
    fn job_type(&self) -> &str {
        EXPIRE_SWEEP
    }

    async fn execute(&self, run: &JobRun) -> Result<Value, JobExecutionError> {
        let now = self.clock.now();
        let report = self
            .manager
            .expire_sweep(now)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Expire sweep failed: {e}")))?;

        if !report.failures.is_empty() {
            warn!(
                run_id = %run.id,
                failed = report.failures.len(),
                "Expire sweep left terms active"
            );
        }

        Ok(serde_json::json!({
            "task": EXPIRE_SWEEP,
            "now": now,
            "transitioned": report.transitioned,
            "failures": report.failures,
        }))
    }
}
