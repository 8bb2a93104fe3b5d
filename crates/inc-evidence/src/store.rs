//! Read-only fixture lookup keyed by incident type.

use std::path::{Path, PathBuf};

use inc_core::entities::Evidence;
use inc_core::routing::normalize_incident_type;
use serde_json::Value;

use crate::error::FixtureError;

/// File names every incident type directory must contain.
pub const FIXTURE_FILES: [&str; 4] = ["logs.json", "metrics.json", "changes.json", "runbook.json"];

/// Fixture files rooted at a directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the four fixtures for `incident_type`.
    ///
    /// The type is validated before touching the filesystem, so it can never
    /// escape the fixture root.
    ///
    /// # Errors
    ///
    /// - `FixtureError::InvalidType` if the type has disallowed characters.
    /// - `FixtureError::Missing` if the directory or any file is absent.
    /// - `FixtureError::Malformed` if a file is not valid JSON.
    pub async fn load(&self, incident_type: &str) -> Result<Evidence, FixtureError> {
        let incident_type = normalize_incident_type(incident_type)?;
        let dir = self.root.join(&incident_type);

        let evidence = Evidence {
            logs: read_json(&dir, &incident_type, "logs.json").await?,
            metrics: read_json(&dir, &incident_type, "metrics.json").await?,
            changes: read_json(&dir, &incident_type, "changes.json").await?,
            runbook: read_json(&dir, &incident_type, "runbook.json").await?,
        };
        tracing::debug!(%incident_type, dir = %dir.display(), "loaded fixtures");
        Ok(evidence)
    }

    /// Whether a complete fixture set exists for `incident_type`.
    pub async fn has(&self, incident_type: &str) -> bool {
        let Ok(incident_type) = normalize_incident_type(incident_type) else {
            return false;
        };
        let dir = self.root.join(incident_type);
        for file in FIXTURE_FILES {
            if !tokio::fs::try_exists(dir.join(file)).await.unwrap_or(false) {
                return false;
            }
        }
        true
    }

    /// Incident types with a fixture directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::Io` if the root cannot be listed.
    pub async fn incident_types(&self) -> Result<Vec<String>, FixtureError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|source| FixtureError::Io {
                path: self.root.clone(),
                source,
            })?;

        let mut types = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| FixtureError::Io {
            path: self.root.clone(),
            source,
        })? {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                types.push(name.to_string());
            }
        }
        types.sort();
        Ok(types)
    }
}

async fn read_json(dir: &Path, incident_type: &str, file: &str) -> Result<Value, FixtureError> {
    let path = dir.join(file);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FixtureError::Missing {
                incident_type: incident_type.to_string(),
                file: file.to_string(),
            });
        }
        Err(source) => {
            return Err(FixtureError::Io { path, source });
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| FixtureError::Malformed { path, source })
}
