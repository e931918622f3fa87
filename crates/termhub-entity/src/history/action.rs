//! Audit action enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An action recorded against a volunteer term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "term_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TermAction {
    /// The teacher signed the term.
    Signed,
    /// Someone opened the signed term.
    Viewed,
    /// The expiry reminder was delivered.
    ReminderSent,
    /// The term was revoked.
    Revoked,
    /// The term reached its expiration date.
    Expired,
}

impl TermAction {
    /// Whether this action records a status transition.
    pub fn is_transition(&self) -> bool {
        match self {
            Self::Signed | Self::Revoked | Self::Expired => true,
            Self::Viewed | Self::ReminderSent => false,
        }
    }

    /// Return the action as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signed => "signed",
            Self::Viewed => "viewed",
            Self::ReminderSent => "reminder_sent",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for TermAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
