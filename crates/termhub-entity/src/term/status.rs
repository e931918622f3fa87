//! Volunteer term status and its state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::history::TermAction;

/// Lifecycle status of a volunteer term.
///
/// `(none) -> Active -> {Expired | Revoked}`; both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "term_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TermStatus {
    /// Signed and in force.
    Active,
    /// Reached its expiration date.
    Expired,
    /// Withdrawn before expiry.
    Revoked,
}

impl TermStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Active => false,
            Self::Expired | Self::Revoked => true,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: TermStatus) -> bool {
        match (self, next) {
            (Self::Active, Self::Expired) | (Self::Active, Self::Revoked) => true,
            (Self::Active, Self::Active) => false,
            (Self::Expired, _) | (Self::Revoked, _) => false,
        }
    }

    /// The history action recorded when a term enters this status.
    pub fn entry_action(&self) -> TermAction {
        match self {
            Self::Active => TermAction::Signed,
            Self::Expired => TermAction::Expired,
            Self::Revoked => TermAction::Revoked,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for TermStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TermStatus {
    type Err = termhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            _ => Err(termhub_core::AppError::validation(format!(
                "Invalid term status: '{s}'. Expected one of: active, expired, revoked"
            ))),
        }
    }
}
