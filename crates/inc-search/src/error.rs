//! Search error types for inc-search.

/// Errors from knowledge base search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Empty or whitespace-only search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Error from the libSQL database (FTS5 queries).
    #[error("database error: {0}")]
    Database(#[from] inc_db::error::ServiceError),
}
