//! # inc-db
//!
//! libSQL storage for the incident service.
//!
//! Holds all relational state (incidents, notes, approval requests) and the
//! knowledge base FTS5 index. [`service::IncidentService`] is the entry point:
//! repository methods live in `repos/` as `impl IncidentService` blocks.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Database handle wrapping a libSQL database and a single connection.
pub struct IncidentDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl IncidentDb {
    /// Open a local database at the given path (`":memory:"` for tests).
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let inc_db = Self { db, conn };
        inc_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(inc_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g. `"INC-A3F8B2C1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8 upper-case hex characters.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(&format!("SELECT '{prefix}-' || hex(randomblob(4))"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> IncidentDb {
        IncidentDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in ["incidents", "incident_notes", "approval_requests", "kb_chunks"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("INC").await.unwrap();
        assert!(id.starts_with("INC-"), "ID should start with 'INC-': {id}");
        assert_eq!(id.len(), 12, "3 prefix + 1 dash + 8 hex: {id}");

        let hex_part = &id[4..];
        assert!(
            hex_part
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()),
            "Random part should be upper hex: {hex_part}"
        );
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_is_unique() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            ids.insert(db.generate_id("APR").await.unwrap());
        }
        assert_eq!(ids.len(), 100);
    }
}
