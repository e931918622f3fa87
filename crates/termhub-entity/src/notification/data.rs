//! Structured notification payloads.
//!
//! Payloads stay typed inside the application and are only turned into
//! JSON when written to the `notifications.data` column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use termhub_core::types::id::TermId;

/// Payload attached to a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationData {
    /// Expiry reminder for a volunteer term.
    TermExpiring {
        /// The expiring term.
        term_id: TermId,
        /// When it expires.
        expiration_date: DateTime<Utc>,
        /// Whole days left at send time.
        days_remaining: i64,
    },
    /// A volunteer term was revoked.
    TermRevoked {
        /// The revoked term.
        term_id: TermId,
        /// Reason given by the revoking user.
        reason: String,
    },
    /// Payload supplied by another subsystem.
    Custom {
        /// Arbitrary key/value fields.
        fields: serde_json::Map<String, serde_json::Value>,
    },
}
