//! Term template repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use termhub_core::error::AppError;
use termhub_core::result::AppResult;
use termhub_core::types::id::TemplateId;
use termhub_entity::template::TermTemplate;

use crate::error::{query_error, transaction_error, transaction_error_or_conflict};
use crate::storage::TemplateStorage;

/// Advisory lock key serializing template activation.
const ACTIVATION_LOCK_KEY: i64 = 0x7465_726d_5f74_706c;

/// Repository for the `term_templates` table.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    /// Create a new template repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_activation(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ACTIVATION_LOCK_KEY)
        .execute(conn)
        .await
        .map(|_| ())
}

async fn deactivate_all_except(
    conn: &mut PgConnection,
    keep: TemplateId,
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    sqlx::query(
        "UPDATE term_templates SET is_active = FALSE, updated_at = $2 \
         WHERE is_active AND id <> $1",
    )
    .bind(keep)
    .bind(at)
    .execute(conn)
    .await
    .map(|r| r.rows_affected())
}

#[async_trait]
impl TemplateStorage for TemplateRepository {
    async fn find_by_id(&self, id: TemplateId) -> AppResult<Option<TermTemplate>> {
        sqlx::query_as::<_, TermTemplate>("SELECT * FROM term_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find template", e))
    }

    async fn find_active(&self) -> AppResult<Option<TermTemplate>> {
        sqlx::query_as::<_, TermTemplate>("SELECT * FROM term_templates WHERE is_active")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find active template", e))
    }

    async fn list(&self) -> AppResult<Vec<TermTemplate>> {
        sqlx::query_as::<_, TermTemplate>(
            "SELECT * FROM term_templates ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to list templates", e))
    }

    async fn insert(&self, template: &TermTemplate) -> AppResult<TermTemplate> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        if template.is_active {
            lock_activation(&mut tx)
                .await
                .map_err(|e| transaction_error("Failed to lock template activation", e))?;
            deactivate_all_except(&mut tx, template.id, template.created_at)
                .await
                .map_err(|e| transaction_error("Failed to deactivate templates", e))?;
        }

        let created = sqlx::query_as::<_, TermTemplate>(
            "INSERT INTO term_templates (id, title, content, version, is_active, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(template.id)
        .bind(&template.title)
        .bind(&template.content)
        .bind(&template.version)
        .bind(template.is_active)
        .bind(template.created_by)
        .bind(template.created_at)
        .bind(template.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            transaction_error_or_conflict(
                "Failed to insert template",
                "another template was activated concurrently",
                e,
            )
        })?;

        tx.commit()
            .await
            .map_err(|e| transaction_error("Failed to commit template", e))?;
        Ok(created)
    }

    async fn activate(&self, id: TemplateId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        lock_activation(&mut tx)
            .await
            .map_err(|e| transaction_error("Failed to lock template activation", e))?;

        let exists: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM term_templates WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| transaction_error("Failed to lock template", e))?;

        match exists {
            None => return Ok(false),
            Some(true) => return Ok(true),
            Some(false) => {}
        }

        deactivate_all_except(&mut tx, id, at)
            .await
            .map_err(|e| transaction_error("Failed to deactivate templates", e))?;

        sqlx::query("UPDATE term_templates SET is_active = TRUE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                transaction_error_or_conflict(
                    "Failed to activate template",
                    "another template was activated concurrently",
                    e,
                )
            })?;

        tx.commit()
            .await
            .map_err(|e| transaction_error("Failed to commit template activation", e))?;
        Ok(true)
    }

    async fn delete_unreferenced(&self, id: TemplateId) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| transaction_error("Failed to begin transaction", e))?;

        let found: Option<TemplateId> =
            sqlx::query_scalar("SELECT id FROM term_templates WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| transaction_error("Failed to lock template", e))?;
        if found.is_none() {
            return Ok(false);
        }

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM volunteer_terms WHERE template_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| transaction_error("Failed to check template references", e))?;
        if referenced {
            return Err(AppError::conflict(
                "template is referenced by signed terms",
            ));
        }

        sqlx::query("DELETE FROM term_templates WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                transaction_error_or_conflict(
                    "Failed to delete template",
                    "template is referenced by signed terms",
                    e,
                )
            })?;

        tx.commit()
            .await
            .map_err(|e| transaction_error("Failed to commit template deletion", e))?;
        Ok(true)
    }
}
