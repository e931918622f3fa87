//! Append-only audit trail of term actions.

use std::sync::Arc;

use tracing::debug;

use termhub_core::result::AppResult;
use termhub_core::types::id::TermId;
use termhub_database::HistoryStorage;
use termhub_entity::history::{NewHistoryEntry, TermHistoryEntry};

/// Reads and appends term history. Entries are never changed once written.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    storage: Arc<dyn HistoryStorage>,
}

impl AuditTrail {
    /// Create a new audit trail.
    pub fn new(storage: Arc<dyn HistoryStorage>) -> Self {
        Self { storage }
    }

    /// Append one entry.
    ///
    /// Status transitions append their entries through the term storage in
    /// the same atomic unit; this is for standalone events like views.
    pub async fn append(&self, entry: NewHistoryEntry) -> AppResult<TermHistoryEntry> {
        let stored = self.storage.append(entry).await?;
        debug!(
            term_id = %stored.term_id,
            action = %stored.action_type,
            "Appended term history entry"
        );
        Ok(stored)
    }

    /// History of a term, newest first.
    pub async fn list_by_term(&self, term_id: TermId) -> AppResult<Vec<TermHistoryEntry>> {
        self.storage.list_by_term(term_id).await
    }
}
