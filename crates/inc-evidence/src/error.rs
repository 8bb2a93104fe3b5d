use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// No fixture directory, or one of the four files is absent.
    #[error("No fixtures for incident type '{incident_type}' (missing {file})")]
    Missing { incident_type: String, file: String },

    #[error("Invalid incident type: {0}")]
    InvalidType(#[from] inc_core::errors::CoreError),

    #[error("Fixture {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
