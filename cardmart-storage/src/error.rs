//! Storage error types

use sea_orm::DbErr;
use thiserror::Error;

use crate::tier::ConnectionTier;

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Failed to connect {tier} tier: {source}")]
    Connect {
        tier: ConnectionTier,
        #[source]
        source: DbErr,
    },

    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether the underlying database refused the statement for lack of
    /// privileges, as opposed to any other failure.
    pub fn is_privilege_violation(&self) -> bool {
        match self {
            StorageError::Database(err) => is_privilege_violation(err),
            _ => false,
        }
    }
}

/// Classify a database error as a credential-level privilege rejection.
///
/// Covers PostgreSQL (`permission denied`, SQLSTATE 42501), MySQL
/// (`command denied`) and SQLite read-only connections.
pub fn is_privilege_violation(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    message.contains("permission denied")
        || message.contains("42501")
        || message.contains("command denied")
        || message.contains("readonly database")
        || message.contains("read-only database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_privilege_violation_detection() {
        let pg = DbErr::Exec(RuntimeErr::Internal(
            "error returned from database: permission denied for table orders".to_string(),
        ));
        assert!(is_privilege_violation(&pg));

        let sqlite = DbErr::Exec(RuntimeErr::Internal(
            "error returned from database: (code: 8) attempt to write a readonly database".to_string(),
        ));
        assert!(is_privilege_violation(&sqlite));

        let other = DbErr::Exec(RuntimeErr::Internal("no such table: orders".to_string()));
        assert!(!is_privilege_violation(&other));
        assert!(!StorageError::Migration("boom".to_string()).is_privilege_violation());
    }
}
