//! Term history repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use termhub_core::result::AppResult;
use termhub_core::types::id::TermId;
use termhub_entity::history::{NewHistoryEntry, TermHistoryEntry};

use crate::error::query_error;
use crate::storage::HistoryStorage;

/// Repository for the append-only `term_history` table.
#[derive(Debug, Clone)]
pub struct TermHistoryRepository {
    pool: PgPool,
}

impl TermHistoryRepository {
    /// Create a new history repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert a history row on an existing connection or transaction.
pub(crate) async fn insert_entry(
    conn: &mut PgConnection,
    entry: NewHistoryEntry,
) -> Result<TermHistoryEntry, sqlx::Error> {
    let row = entry.into_entry();
    sqlx::query_as::<_, TermHistoryEntry>(
        "INSERT INTO term_history (id, term_id, action_type, action_date, actor_id, details, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(row.id)
    .bind(row.term_id)
    .bind(row.action_type)
    .bind(row.action_date)
    .bind(row.actor_id)
    .bind(&row.details)
    .bind(row.created_by)
    .fetch_one(conn)
    .await
}

#[async_trait]
impl HistoryStorage for TermHistoryRepository {
    async fn append(&self, entry: NewHistoryEntry) -> AppResult<TermHistoryEntry> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| query_error("Failed to acquire connection", e))?;
        insert_entry(&mut conn, entry)
            .await
            .map_err(|e| query_error("Failed to append history entry", e))
    }

    async fn list_by_term(&self, term_id: TermId) -> AppResult<Vec<TermHistoryEntry>> {
        sqlx::query_as::<_, TermHistoryEntry>(
            "SELECT * FROM term_history WHERE term_id = $1 ORDER BY action_date DESC, id DESC",
        )
        .bind(term_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to list term history", e))
    }
}
