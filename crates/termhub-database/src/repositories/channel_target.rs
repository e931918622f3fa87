//! Channel target repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use termhub_core::result::AppResult;
use termhub_core::types::id::UserId;
use termhub_entity::notification::ChannelKind;

use crate::error::query_error;
use crate::storage::ChannelTargetDirectory;

/// Repository for the `channel_targets` table.
#[derive(Debug, Clone)]
pub struct ChannelTargetRepository {
    pool: PgPool,
}

impl ChannelTargetRepository {
    /// Create a new channel target repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelTargetDirectory for ChannelTargetRepository {
    async fn find_target(
        &self,
        user_id: UserId,
        channel: ChannelKind,
    ) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT target FROM channel_targets WHERE user_id = $1 AND channel = $2")
            .bind(user_id)
            .bind(channel)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("Failed to find channel target", e))
    }

    async fn upsert_target(
        &self,
        user_id: UserId,
        channel: ChannelKind,
        target: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO channel_targets (user_id, channel, target, updated_at) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, channel) DO UPDATE SET target = $3, updated_at = $4",
        )
        .bind(user_id)
        .bind(channel)
        .bind(target)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("Failed to upsert channel target", e))?;
        Ok(())
    }
}
