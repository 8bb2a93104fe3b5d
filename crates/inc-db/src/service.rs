//! Service layer combining the database with the fixture store.
//!
//! `IncidentService` wraps `IncidentDb` (raw database access) and
//! `FixtureStore` (canned evidence). Repo methods are implemented as
//! `impl IncidentService` blocks under `repos/`.

use std::path::PathBuf;

use inc_evidence::FixtureStore;

use crate::IncidentDb;
use crate::error::DatabaseError;

/// Domain operations over incidents, notes, approvals, and KB chunks.
///
/// Holds a single libSQL connection; share it behind an `Arc`.
pub struct IncidentService {
    db: IncidentDb,
    fixtures: FixtureStore,
}

impl IncidentService {
    /// Open a local database, run migrations, and seed the knowledge base.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `fixtures_dir` - Root of the per-incident-type fixture directories.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or seeded.
    pub async fn new_local(
        db_path: &str,
        fixtures_dir: impl Into<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = IncidentDb::open_local(db_path).await?;
        let svc = Self::from_db(db, FixtureStore::new(fixtures_dir));
        let seeded = svc.seed_kb().await?;
        tracing::info!(db_path, seeded, "incident service ready");
        Ok(svc)
    }

    /// Create from an existing `IncidentDb` (no seeding).
    #[must_use]
    pub const fn from_db(db: IncidentDb, fixtures: FixtureStore) -> Self {
        Self { db, fixtures }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &IncidentDb {
        &self.db
    }

    /// Access the fixture store.
    #[must_use]
    pub const fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }
}
