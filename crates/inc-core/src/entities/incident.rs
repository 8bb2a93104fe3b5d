use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{IncidentStatus, OwnerRole, Severity};

/// A team owning an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Owner {
    pub team: String,
    pub role: OwnerRole,
}

/// An incident record. Mutated by assign and resolve; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Incident {
    pub id: String,
    pub incident_type: String,
    pub status: IncidentStatus,
    pub assignee: Option<String>,
    pub severity: Severity,
    pub service: String,
    pub signal: Option<String>,
    pub impact: Option<String>,
    pub region: Option<String>,
    pub owners: Vec<Owner>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an incident.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewIncident {
    /// Incident type tag, e.g. `payments_failing`. Keys fixture lookup.
    #[serde(rename = "type", alias = "incident_type")]
    pub incident_type: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl NewIncident {
    pub fn of_type(incident_type: impl Into<String>) -> Self {
        Self {
            incident_type: incident_type.into(),
            ..Self::default()
        }
    }
}
