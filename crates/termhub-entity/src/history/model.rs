//! Term history entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use termhub_core::types::id::{HistoryEntryId, TermId, UserId};

use super::action::TermAction;

/// An immutable record of something that happened to a term.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TermHistoryEntry {
    /// Unique entry identifier.
    pub id: HistoryEntryId,
    /// The term this entry belongs to.
    pub term_id: TermId,
    /// What happened.
    pub action_type: TermAction,
    /// When it happened.
    pub action_date: DateTime<Utc>,
    /// Who did it. `None` for system sweeps.
    pub actor_id: Option<UserId>,
    /// Free-text details (e.g. revocation reason).
    pub details: Option<String>,
    /// Who wrote the entry.
    pub created_by: Option<UserId>,
}

/// A history entry waiting to be appended.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    /// Target term.
    pub term_id: TermId,
    /// Action being recorded.
    pub action_type: TermAction,
    /// Action time.
    pub action_date: DateTime<Utc>,
    /// Acting user, if any.
    pub actor_id: Option<UserId>,
    /// Free-text details.
    pub details: Option<String>,
}

impl NewHistoryEntry {
    /// Build an entry with no details.
    pub fn new(
        term_id: TermId,
        action_type: TermAction,
        action_date: DateTime<Utc>,
        actor_id: Option<UserId>,
    ) -> Self {
        Self {
            term_id,
            action_type,
            action_date,
            actor_id,
            details: None,
        }
    }

    /// Attach free-text details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Materialize the row as it will be stored.
    pub fn into_entry(self) -> TermHistoryEntry {
        TermHistoryEntry {
            id: HistoryEntryId::new(),
            term_id: self.term_id,
            action_type: self.action_type,
            action_date: self.action_date,
            actor_id: self.actor_id,
            details: self.details,
            created_by: self.actor_id,
        }
    }
}
