//! HTTP server and storage locations.

use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_database_path() -> String {
    "incidents.db".to_string()
}

fn default_fixtures_dir() -> String {
    "fixtures".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// libSQL database file. `:memory:` keeps everything in process.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory holding `<incident_type>/{logs,metrics,changes,runbook}.json`.
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
            fixtures_dir: default_fixtures_dir(),
        }
    }
}
