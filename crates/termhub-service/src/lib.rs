//! # termhub-service
//!
//! Business logic for volunteer terms. Each service orchestrates the
//! storage traits and the notification sender to implement one use case
//! family.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod app;
pub mod audit;
pub mod context;
pub mod template;
pub mod term;

pub use app::{Backends, Services};
pub use audit::AuditTrail;
pub use context::ActorContext;
pub use template::TermTemplateStore;
pub use term::{ReminderReport, SignRequest, SweepFailure, SweepReport, TermLifecycleManager};
