//! External delivery channel identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use termhub_core::types::id::UserId;

/// Kind of external delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "channel_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Chat bot (e.g. Telegram).
    Chat,
    /// Email.
    Email,
}

impl ChannelKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = termhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "email" => Ok(Self::Email),
            _ => Err(termhub_core::AppError::validation(format!(
                "Invalid channel kind: '{s}'. Expected one of: chat, email"
            ))),
        }
    }
}

/// Address of a user on an external channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChannelTarget {
    /// The user.
    pub user_id: UserId,
    /// Channel kind.
    pub channel: ChannelKind,
    /// Channel-specific address (chat id, email address).
    pub target: String,
    /// When the address was last set.
    pub updated_at: DateTime<Utc>,
}
