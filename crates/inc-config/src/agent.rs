//! Agent loop budgets and fallback settings.

use serde::{Deserialize, Serialize};

const fn default_max_iterations() -> u32 {
    6
}

const fn default_max_tool_calls() -> u32 {
    12
}

fn default_incident_type() -> String {
    "payments_failing".to_string()
}

const fn default_next_update_minutes() -> u32 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Maximum model round trips per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Maximum tool invocations per run.
    #[serde(default = "default_max_tool_calls")]
    pub max_tool_calls: u32,

    /// Incident type used for the fixture fallback when nothing else names one.
    #[serde(default = "default_incident_type")]
    pub default_incident_type: String,

    #[serde(default = "default_next_update_minutes")]
    pub next_update_minutes: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_tool_calls: default_max_tool_calls(),
            default_incident_type: default_incident_type(),
            next_update_minutes: default_next_update_minutes(),
        }
    }
}
