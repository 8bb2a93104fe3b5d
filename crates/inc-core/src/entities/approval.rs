use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ApprovalState;

/// A pending human decision tracked against an incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub id: String,
    pub incident_id: String,
    pub state: ApprovalState,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    /// Chat channel the request was posted to, if any.
    pub channel_id: Option<String>,
    /// Chat thread timestamp, if any.
    pub thread_ts: Option<String>,
    /// Original alert payload.
    pub alert: Option<serde_json::Value>,
}

/// Input for enqueuing an approval request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewApproval {
    pub incident_id: String,
    #[serde(default)]
    pub alert: Option<serde_json::Value>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

impl NewApproval {
    pub fn for_incident(incident_id: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            ..Self::default()
        }
    }
}
