//! Background sweep configuration.

use serde::{Deserialize, Serialize};

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL via sqlx.
    Postgres,
    /// Process-local in-memory store.
    Memory,
}

/// Scheduled sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the expiry sweep.
    #[serde(default = "default_expire_cron")]
    pub expire_cron: String,
    /// Cron expression (with seconds) for the reminder sweep.
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,
    /// Storage backend used by the daemon.
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            expire_cron: default_expire_cron(),
            reminder_cron: default_reminder_cron(),
            storage: default_storage(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expire_cron() -> String {
    "0 0 1 * * *".to_string()
}

fn default_reminder_cron() -> String {
    "0 0 8 * * *".to_string()
}

fn default_storage() -> StorageBackend {
    StorageBackend::Postgres
}
