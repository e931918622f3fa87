//! Volunteer term repository implementation.
//!
//! The one-active-term-per-teacher rule is backed by the partial unique
//! index `volunteer_terms_one_active_per_teacher`; a concurrent signer that
//! loses the race gets a unique violation, mapped to a conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::types::id::{TermId, UserId};
use termhub_entity::history::NewHistoryEntry;
use termhub_entity::term::{NewTerm, TermStatus, VolunteerTerm};

use super::history::insert_entry;
use crate::error::{query_error, transaction_error, transaction_error_or_conflict};
use crate::storage::{ACTIVE_TERM_EXISTS, INACTIVE_TEMPLATE, TermStorage};

/// Repository for the `volunteer_terms` table.
#[derive(Debug, Clone)]
pub struct TermRepository {
    pool: PgPool,
}

impl TermRepository {
    /// Create a new term repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TermStorage for TermRepository {
    async fn find_by_id(&self, id: TermId) -> AppResult<Option<VolunteerTerm>> {
        sqlx::query_as::<_, VolunteerTerm>("SELECT * FROM volunteer_terms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find term", e))
    }

    async fn find_active_by_teacher(&self, teacher_id: UserId) -> AppResult<Option<VolunteerTerm>> {
        sqlx::query_as::<_, VolunteerTerm>(
            "SELECT * FROM volunteer_terms WHERE teacher_id = $1 AND status = 'active'",
        )
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("Failed to find active term", e))
    }

    async fn list_by_teacher(&self, teacher_id: UserId) -> AppResult<Vec<VolunteerTerm>> {
        sqlx::query_as::<_, VolunteerTerm>(
            "SELECT * FROM volunteer_terms WHERE teacher_id = $1 ORDER BY signed_at DESC, id DESC",
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to list teacher terms", e))
    }

    async fn find_active_expired_before(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<VolunteerTerm>> {
        sqlx::query_as::<_, VolunteerTerm>(
            "SELECT * FROM volunteer_terms WHERE status = 'active' AND expiration_date < $1 \
             ORDER BY expiration_date ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to find expired terms", e))
    }

    async fn find_active_expiring_by(
        &self,
        limit: DateTime<Utc>,
        unreminded_only: bool,
    ) -> AppResult<Vec<VolunteerTerm>> {
        sqlx::query_as::<_, VolunteerTerm>(
            "SELECT * FROM volunteer_terms \
             WHERE status = 'active' AND expiration_date <= $1 \
               AND ($2 = FALSE OR reminder_sent = FALSE) \
             ORDER BY expiration_date ASC",
        )
        .bind(limit)
        .bind(unreminded_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to find expiring terms", e))
    }

    async fn insert_signed(
        &self,
        term: NewTerm,
        entry: NewHistoryEntry,
    ) -> AppResult<VolunteerTerm> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        // Holding a share lock keeps the template active until commit.
        let template_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM term_templates WHERE id = $1 FOR SHARE")
                .bind(term.template_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| transaction_error("Failed to lock template", e))?;
        if template_active != Some(true) {
            return Err(AppError::validation(INACTIVE_TEMPLATE));
        }

        let row = term.into_term();
        let created = sqlx::query_as::<_, VolunteerTerm>(
            "INSERT INTO volunteer_terms (id, teacher_id, template_id, signed_at, expiration_date, status, \
             reminder_sent, ip_address, device_info, signature_type, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(row.id)
        .bind(row.teacher_id)
        .bind(row.template_id)
        .bind(row.signed_at)
        .bind(row.expiration_date)
        .bind(row.status)
        .bind(row.reminder_sent)
        .bind(&row.ip_address)
        .bind(&row.device_info)
        .bind(row.signature_type)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| transaction_error_or_conflict("Failed to insert term", ACTIVE_TERM_EXISTS, e))?;

        insert_entry(&mut tx, entry)
            .await
            .map_err(|e| transaction_error("Failed to append signed entry", e))?;

        tx.commit()
            .await
            .map_err(|e| transaction_error_or_conflict("Failed to commit term", ACTIVE_TERM_EXISTS, e))?;
        Ok(created)
    }

    async fn transition(
        &self,
        id: TermId,
        to: TermStatus,
        entry: NewHistoryEntry,
    ) -> AppResult<Option<VolunteerTerm>> {
        if !TermStatus::Active.can_transition_to(to) {
            return Err(AppError::validation(format!(
                "illegal transition to '{to}'"
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        let updated = sqlx::query_as::<_, VolunteerTerm>(
            "UPDATE volunteer_terms SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'active' RETURNING *",
        )
        .bind(id)
        .bind(to)
        .bind(entry.action_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| transaction_error("Failed to update term status", e))?;

        let Some(updated) = updated else {
            debug!(term_id = %id, to = %to, "Term not active, transition skipped");
            return Ok(None);
        };

        insert_entry(&mut tx, entry)
            .await
            .map_err(|e| transaction_error("Failed to append transition entry", e))?;

        tx.commit()
            .await
            .map_err(|e| transaction_error("Failed to commit term transition", e))?;
        Ok(Some(updated))
    }

    async fn mark_reminded(&self, id: TermId, entry: NewHistoryEntry) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        let result = sqlx::query(
            "UPDATE volunteer_terms SET reminder_sent = TRUE, updated_at = $2 \
             WHERE id = $1 AND status = 'active' AND reminder_sent = FALSE",
        )
        .bind(id)
        .bind(entry.action_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| transaction_error("Failed to mark term reminded", e))?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        insert_entry(&mut tx, entry)
            .await
            .map_err(|e| transaction_error("Failed to append reminder entry", e))?;

        tx.commit()
            .await
            .map_err(|e| transaction_error("Failed to commit reminder", e))?;
        Ok(true)
    }
}
