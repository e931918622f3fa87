//! Mapping of sqlx errors into [`AppError`].

use termhub_core::error::{AppError, ErrorKind};

/// Map a failure of a standalone query.
pub fn query_error(context: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{context}: {err}"), err)
}

/// Map a failure inside a transaction.
///
/// The caller drops the transaction on error, which rolls it back.
pub fn transaction_error(context: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Transaction, format!("{context}: {err}"), err)
}

/// Map a failure inside a transaction, turning a unique or foreign-key
/// violation into a conflict carrying `conflict_message`.
pub fn transaction_error_or_conflict(
    context: &str,
    conflict_message: &str,
    err: sqlx::Error,
) -> AppError {
    if is_constraint_violation(&err) {
        return AppError::with_source(ErrorKind::Conflict, conflict_message, err);
    }
    transaction_error(context, err)
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation() || db.is_foreign_key_violation())
        .unwrap_or(false)
}
