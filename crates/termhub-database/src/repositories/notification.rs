//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use termhub_core::result::AppResult;
use termhub_core::types::id::{NotificationId, UserId};
use termhub_entity::notification::InAppNotification;

use crate::error::query_error;
use crate::storage::NotificationStorage;

/// Repository for the `notifications` table.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete notifications created before `before`.
    pub async fn cleanup_old(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("Failed to cleanup notifications", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationStorage for NotificationRepository {
    async fn insert(&self, n: &InAppNotification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, event_type, priority, data, \
             action_url, read, read_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(n.id)
        .bind(n.user_id)
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.event_type)
        .bind(n.priority)
        .bind(&n.data)
        .bind(&n.action_url)
        .bind(n.read)
        .bind(n.read_at)
        .bind(n.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("Failed to create notification", e))?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<InAppNotification>> {
        sqlx::query_as::<_, InAppNotification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR read = FALSE) \
             ORDER BY created_at DESC, id DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("Failed to list notifications", e))
    }

    async fn count_unread(&self, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error("Failed to count unread", e))
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, read_at = $2 WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }
}
