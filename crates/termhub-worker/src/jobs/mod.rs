//! Built-in job handler implementations.

pub mod expiry;
pub mod reminder;

pub use expiry::ExpireSweepJobHandler;
pub use reminder::ReminderSweepJobHandler;

/// Job type of the expiry sweep.
pub const EXPIRE_SWEEP: &str = "term_expire_sweep";

/// Job type of the reminder sweep.
pub const REMINDER_SWEEP: &str = "term_reminder_sweep";
