use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The four fixture payloads for one incident type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Evidence {
    pub logs: serde_json::Value,
    pub metrics: serde_json::Value,
    pub changes: serde_json::Value,
    pub runbook: serde_json::Value,
}

/// Evidence resolved for a concrete incident. Read-only snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EvidenceBundle {
    pub incident_id: String,
    pub incident_type: String,
    pub service: String,
    pub region: Option<String>,
    pub evidence: Evidence,
}
