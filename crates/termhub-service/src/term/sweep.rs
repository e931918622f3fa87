//! Batch operations over many terms: expiry and reminders.
//!
//! A failure on one term is recorded in the report and the sweep moves on.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use termhub_core::result::AppResult;
use termhub_core::traits::Clock;
use termhub_core::types::id::{TermId, UserId};
use termhub_entity::history::{NewHistoryEntry, TermAction};
use termhub_entity::term::{TermStatus, VolunteerTerm};
use termhub_notify::NotificationFormatter;

use super::lifecycle::TermLifecycleManager;

/// A term a sweep could not process.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    /// The term.
    pub term_id: TermId,
    /// Error description.
    pub error: String,
}

/// Result of an expiry sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Terms moved to `expired` by this run.
    pub transitioned: usize,
    /// Terms that failed to transition.
    pub failures: Vec<SweepFailure>,
}

/// Result of a reminder sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderReport {
    /// Terms reminded and flagged by this run.
    pub sent: usize,
    /// Terms whose reminder failed.
    pub failed: usize,
    /// Terms picked up but already reminded or closed by someone else.
    pub skipped: usize,
    /// Details of each failure.
    pub failures: Vec<SweepFailure>,
}

impl TermLifecycleManager {
    /// Expire every active term whose expiration date is before `now`.
    ///
    /// Running it again with the same `now` changes nothing.
    pub async fn expire_sweep(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let candidates = self.terms.find_active_expired_before(now).await?;
        let mut report = SweepReport::default();

        for term in candidates {
            let entry = NewHistoryEntry::new(term.id, TermAction::Expired, now, None);
            match self.terms.transition(term.id, TermStatus::Expired, entry).await {
                Ok(Some(_)) => {
                    debug!(term_id = %term.id, teacher_id = %term.teacher_id, "Term expired");
                    report.transitioned += 1;
                }
                Ok(None) => {
                    debug!(term_id = %term.id, "Term left active state before expiry");
                }
                Err(e) => {
                    warn!(term_id = %term.id, error = %e, "Failed to expire term");
                    report.failures.push(SweepFailure {
                        term_id: term.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            transitioned = report.transitioned,
            failed = report.failures.len(),
            "Expire sweep finished"
        );
        Ok(report)
    }

    /// Active terms expiring on or before `limit`, soonest first, whether
    /// or not they were reminded.
    pub async fn get_expiring(&self, limit: DateTime<Utc>) -> AppResult<Vec<VolunteerTerm>> {
        self.terms.find_active_expiring_by(limit, false).await
    }

    /// Remind every unreminded active term expiring on or before `limit`.
    ///
    /// A term is flagged `reminder_sent` only after its notification was
    /// accepted, so a failed term is picked up again by the next run.
    pub async fn reminder_sweep(
        &self,
        limit: DateTime<Utc>,
        actor_id: Option<UserId>,
    ) -> AppResult<ReminderReport> {
        let candidates = self.terms.find_active_expiring_by(limit, true).await?;
        let mut report = ReminderReport::default();

        for term in candidates {
            let now = self.clock.now();
            let request =
                NotificationFormatter::term_expiring(&term, now, &self.config.renewal_url);
            let priority = request.priority;

            let dispatched = match self.notifier.send_notification(request).await {
                Ok(dispatched) => dispatched,
                Err(e) => {
                    warn!(term_id = %term.id, error = %e, "Reminder notification failed");
                    report.failed += 1;
                    report.failures.push(SweepFailure {
                        term_id: term.id,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let entry = NewHistoryEntry::new(term.id, TermAction::ReminderSent, now, actor_id)
                .with_details(format!(
                    "{priority} reminder, notification {}",
                    dispatched.notification_id
                ));
            match self.terms.mark_reminded(term.id, entry).await {
                Ok(true) => {
                    debug!(term_id = %term.id, priority = %priority, "Reminder sent");
                    report.sent += 1;
                }
                Ok(false) => {
                    debug!(term_id = %term.id, "Term no longer eligible for a reminder");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(term_id = %term.id, error = %e, "Failed to flag reminded term");
                    report.failed += 1;
                    report.failures.push(SweepFailure {
                        term_id: term.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "Reminder sweep finished"
        );
        Ok(report)
    }

    /// Limit date for a reminder sweep run at `now`.
    pub fn reminder_limit(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.config.reminder_window_days)
    }
}
