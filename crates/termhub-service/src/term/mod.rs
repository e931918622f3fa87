//! Volunteer term lifecycle.

pub mod lifecycle;
pub mod sweep;

pub use lifecycle::{SignRequest, TermLifecycleManager};
pub use sweep::{ReminderReport, SweepFailure, SweepReport};
