//! Translation of `sqlx` failures into domain errors.

use dealroom_core::error::CoreError;

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a database error onto [`CoreError`].
///
/// Unique violations on constraints named `uq_*` become `Conflict` so the
/// services can recover from races; everything else is logged and becomes
/// an opaque `Internal`.
pub fn classify(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint '{constraint}'"
                ));
            }
            tracing::error!(error = %db_err, "Database error");
            CoreError::Internal("database error".into())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Internal("database error".into())
        }
    }
}

/// A stored value the domain types cannot represent (e.g. an unknown status).
pub fn corrupt_row(table: &str, id: i64, err: CoreError) -> CoreError {
    tracing::error!(table, id, error = %err, "Unreadable row");
    CoreError::Internal(format!("unreadable {table} row {id}"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn row_not_found_is_internal() {
        assert_matches!(classify(sqlx::Error::RowNotFound), CoreError::Internal(_));
    }

    #[test]
    fn pool_timeout_is_internal() {
        assert_matches!(classify(sqlx::Error::PoolTimedOut), CoreError::Internal(_));
    }
}
