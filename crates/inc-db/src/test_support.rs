//! Shared test utilities for inc-db and the crates built on it.

use std::path::PathBuf;

use inc_evidence::FixtureStore;

use crate::IncidentDb;
use crate::error::DatabaseError;
use crate::service::IncidentService;

/// The fixture directory shipped at the workspace root.
#[must_use]
pub fn workspace_fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
}

/// In-memory service over the shipped fixtures, KB seeded.
///
/// # Errors
///
/// Returns `DatabaseError` if the in-memory database cannot be opened.
pub async fn test_service() -> Result<IncidentService, DatabaseError> {
    IncidentService::new_local(":memory:", workspace_fixtures()).await
}

/// In-memory service over a custom fixture root, KB left empty.
///
/// # Errors
///
/// Returns `DatabaseError` if the in-memory database cannot be opened.
pub async fn test_service_with_fixtures(
    root: impl Into<PathBuf>,
) -> Result<IncidentService, DatabaseError> {
    let db = IncidentDb::open_local(":memory:").await?;
    Ok(IncidentService::from_db(db, FixtureStore::new(root)))
}
