//! Notification priority levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How urgently a notification needs the recipient's attention.
///
/// Ordered from least to most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Informational, in-app only.
    Low,
    /// Worth an email.
    Medium,
    /// Important, every external channel.
    High,
    /// Requires immediate attention.
    Urgent,
}

impl NotificationPriority {
    /// Priority for an expiry reminder `days` before the expiration date.
    pub fn for_days_until_expiry(days: i64) -> Self {
        match days {
            i64::MIN..=3 => Self::Urgent,
            4..=7 => Self::High,
            8..=15 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationPriority {
    type Err = termhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(termhub_core::AppError::validation(format!(
                "Invalid priority: '{s}'. Expected one of: low, medium, high, urgent"
            ))),
        }
    }
}
