//! Database and service error types for inc-db.

use inc_core::errors::CoreError;
use inc_evidence::FixtureError;
use thiserror::Error;

/// Errors from raw database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned unparseable data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced by [`IncidentService`](crate::service::IncidentService).
///
/// Domain failures (not found, validation, invalid transition) travel as
/// `CoreError`; missing evidence as `FixtureError`; everything else is a
/// storage failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<libsql::Error> for ServiceError {
    fn from(err: libsql::Error) -> Self {
        Self::Database(DatabaseError::LibSql(err))
    }
}

impl ServiceError {
    /// Whether this is a `NotFound` for any entity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    #[must_use]
    pub const fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Core(CoreError::InvalidTransition { .. }))
    }
}
