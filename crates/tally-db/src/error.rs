//! # Persistence Error Types
//!
//! ## Error Flow
//! ```text
//! SQLite error (sqlx::Error)
//!      │
//!      ▼
//! StoreError (this module)  ← adds context and categorization
//!      │
//!      ▼
//! CommitError (checkout.rs) ← checkout-specific failure modes
//!      │
//!      ▼
//! Caller surfaces a failed transaction; no partial state exists
//! ```

use thiserror::Error;

/// Persistence operation errors.
///
/// These wrap sqlx errors and provide enough categorization for callers
/// to decide between retrying (transient) and aborting (constraint).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate SKU, barcode, or receipt
    /// number).
    #[error("duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation (dangling product/sale/customer
    /// reference).
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A persistence call exceeded its bounded timeout. Transient:
    /// eligible for a whole-commit retry, never a partial patch-up.
    #[error("persistence timeout: {0}")]
    Timeout(String),

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when this error is a unique-constraint violation on the given
    /// column (matched against SQLite's `table.column` spelling).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { field } if field.contains(column))
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound   → StoreError::NotFound
/// sqlx::Error::Database      → analyze message for constraint type
/// sqlx::Error::PoolTimedOut  → StoreError::Timeout (bounded acquire)
/// other                      → StoreError::Internal
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StoreError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    StoreError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    StoreError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                StoreError::Timeout("connection pool acquire timed out".to_string())
            }

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("pool is closed".to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;
