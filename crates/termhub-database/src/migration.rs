//! Embedded schema migrations.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use termhub_core::error::{AppError, ErrorKind};

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every embedded migration the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(embedded = MIGRATOR.iter().count(), "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Schema migration failed: {e}"), e)
    })?;

    info!("Schema is up to date");
    Ok(())
}

/// Version and description of every migration compiled into the binary.
pub fn embedded_migrations() -> Vec<(i64, String)> {
    MIGRATOR
        .iter()
        .map(|m| (m.version, m.description.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_migration_is_embedded() {
        let migrations = embedded_migrations();
        assert!(
            migrations
                .iter()
                .any(|(version, _)| *version == 20250101000000)
        );
    }
}
