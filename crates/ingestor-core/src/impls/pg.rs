//! PostgreSQL 共通: プール生成・エラー分類・識別子の検証

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::domain::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SQL identifier {0:?}: use letters, digits and underscores")]
pub struct InvalidIdentifier(pub String);

/// Create the shared pool. Connections are opened lazily on first use, so a
/// database that is down at startup shows up as per-message persistence
/// failures (and retries) rather than a crash.
pub fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_lazy(database_url)
}

/// Pings the database to verify connectivity.
pub async fn ping(pool: &PgPool) -> Result<(), PersistenceError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(classify_error)?;
    tracing::debug!("postgreSQL connection successful");
    Ok(())
}

/// Quote a table name for interpolation into SQL. Table names come from
/// configuration, never from messages.
pub fn quote_identifier(name: &str) -> Result<String, InvalidIdentifier> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("\"{name}\""))
    } else {
        Err(InvalidIdentifier(name.to_string()))
    }
}

/// Map a sqlx error onto the persistence taxonomy.
///
/// SQLSTATE class 08 (connection) and 57 (operator intervention) are
/// `Unavailable`; class 22 (data exception, e.g. value too long) and 23
/// (integrity) are `Constraint`.
pub fn classify_error(err: sqlx::Error) -> PersistenceError {
    match &err {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.to_string()).unwrap_or_default();
            if code.starts_with("08") || code.starts_with("57") {
                PersistenceError::Unavailable(err.to_string())
            } else if code.starts_with("22") || code.starts_with("23") {
                PersistenceError::Constraint(err.to_string())
            } else {
                PersistenceError::Other(err.to_string())
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PersistenceError::Unavailable(err.to_string()),
        _ => PersistenceError::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user_logins")]
    #[case("_staging2")]
    #[case("LoginQueue")]
    fn valid_identifiers_are_quoted(#[case] name: &str) {
        assert_eq!(quote_identifier(name).unwrap(), format!("\"{name}\""));
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_digit("1logins")]
    #[case::injection("user_logins; DROP TABLE x")]
    #[case::quote("a\"b")]
    #[case::schema_dot("public.user_logins")]
    fn invalid_identifiers_are_rejected(#[case] name: &str) {
        assert_eq!(
            quote_identifier(name).unwrap_err(),
            InvalidIdentifier(name.to_string())
        );
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            classify_error(sqlx::Error::PoolTimedOut),
            PersistenceError::Unavailable(_)
        ));
        assert!(matches!(
            classify_error(sqlx::Error::PoolClosed),
            PersistenceError::Unavailable(_)
        ));
    }

    #[test]
    fn other_errors_are_other() {
        assert!(matches!(
            classify_error(sqlx::Error::RowNotFound),
            PersistenceError::Other(_)
        ));
    }
}
