//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Domain rejection (CoreError)        │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context, categorization and a code       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller shows `message` and branches on `code()`                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use daycare_core::{CoreError, IssuanceError, ValidationError};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and domain rejections so every repository
/// call has one error type.
#[derive(Debug, Error)]
pub enum DbError {
    /// A domain rule rejected the operation before anything was written.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate CPF
    /// - Duplicate state abbreviation
    /// - A second note for the same scheduling (mapped to `AlreadyIssued`
    ///   by the note repository)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Attaching a service id that does not exist
    /// - Referencing a missing tutor, pet, state or city
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (CHECK constraints, runtime SQL errors).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The issuance rejection inside this error, if that is what it is.
    pub fn as_issuance(&self) -> Option<&IssuanceError> {
        match self {
            DbError::Domain(CoreError::Issuance(err)) => Some(err),
            _ => None,
        }
    }

    /// The validation failure inside this error, if that is what it is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DbError::Domain(CoreError::Validation(err)) => Some(err),
            _ => None,
        }
    }

    /// Machine-readable code for callers that branch on the failure kind.
    ///
    /// ```text
    /// VALIDATION_ERROR      bad input, nothing written
    /// PERMISSION_DENIED     actor lacks add_note
    /// ALREADY_ISSUED        note exists (not a fault)
    /// PAYMENT_PENDING       scheduling not paid
    /// INVALID_STATUS        would un-pay an issued scheduling
    /// NOT_FOUND / DUPLICATE / FOREIGN_KEY / DATABASE_ERROR
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Domain(CoreError::Validation(_)) => "VALIDATION_ERROR",
            DbError::Domain(CoreError::Issuance(IssuanceError::PermissionDenied { .. })) => {
                "PERMISSION_DENIED"
            }
            DbError::Domain(CoreError::Issuance(IssuanceError::AlreadyIssued { .. })) => {
                "ALREADY_ISSUED"
            }
            DbError::Domain(CoreError::Issuance(IssuanceError::PaymentPending { .. })) => {
                "PAYMENT_PENDING"
            }
            DbError::Domain(CoreError::InvalidStatusChange { .. }) => "INVALID_STATUS",
            DbError::NotFound { .. } => "NOT_FOUND",
            DbError::UniqueViolation { .. } => "DUPLICATE",
            DbError::ForeignKeyViolation { .. } => "FOREIGN_KEY",
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => "DATABASE_ERROR",
        }
    }

    /// Persistence failures, as opposed to domain rejections.
    pub fn is_persistence_failure(&self) -> bool {
        !matches!(self, DbError::Domain(_) | DbError::NotFound { .. })
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

impl From<IssuanceError> for DbError {
    fn from(err: IssuanceError) -> Self {
        DbError::Domain(CoreError::Issuance(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Configuration Error
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
