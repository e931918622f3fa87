//! Scheduled sweeps for TermHub.
//!
//! This crate provides:
//! - A job executor that dispatches runs to the registered handler and
//!   keeps each job type single-flight
//! - A cron scheduler that triggers the executor
//! - The expiry and reminder sweep job handlers

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobRun};
pub use scheduler::CronScheduler;
