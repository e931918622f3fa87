//! Notification messages for term lifecycle events.

use chrono::{DateTime, Utc};

use termhub_core::types::id::UserId;
use termhub_entity::notification::{
    NotificationData, NotificationPriority, NotificationRequest, event,
};
use termhub_entity::term::VolunteerTerm;

/// Builds notification requests for common term events.
pub struct NotificationFormatter;

impl NotificationFormatter {
    /// Expiry reminder for `term`, with priority derived from the days left
    /// at `now`.
    pub fn term_expiring(
        term: &VolunteerTerm,
        now: DateTime<Utc>,
        renewal_url: &str,
    ) -> NotificationRequest {
        let days = term.days_until_expiry(now);
        let when = match days {
            _ if term.expiration_date < now => "has expired".to_string(),
            0 => "expires today".to_string(),
            1 => "expires tomorrow".to_string(),
            d => format!("expires in {d} days"),
        };

        NotificationRequest::new(
            term.teacher_id,
            event::TERM_EXPIRING,
            "Volunteer term expiring",
            format!(
                "Your volunteer term {when} ({}). Renew it to keep teaching.",
                term.expiration_date.format("%Y-%m-%d")
            ),
            NotificationPriority::for_days_until_expiry(days),
        )
        .with_data(NotificationData::TermExpiring {
            term_id: term.id,
            expiration_date: term.expiration_date,
            days_remaining: days,
        })
        .with_action_url(renewal_url)
    }

    /// Notice to the teacher that `term` was revoked.
    pub fn term_revoked(term: &VolunteerTerm, reason: &str) -> NotificationRequest {
        NotificationRequest::new(
            term.teacher_id,
            event::TERM_REVOKED,
            "Volunteer term revoked",
            format!("Your volunteer term was revoked: {reason}"),
            NotificationPriority::High,
        )
        .with_data(NotificationData::TermRevoked {
            term_id: term.id,
            reason: reason.to_string(),
        })
    }

    /// Free-form message from an administrator.
    pub fn admin_message(
        user_id: UserId,
        title: &str,
        message: &str,
        priority: NotificationPriority,
    ) -> NotificationRequest {
        NotificationRequest::new(user_id, event::ADMIN_MESSAGE, title, message, priority)
    }
}
