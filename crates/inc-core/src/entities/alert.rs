use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::NewIncident;
use crate::enums::Severity;

/// An inbound monitoring alert. Every field is optional; unknown keys are kept
/// in `extra` so the alert can be echoed back verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Alert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_summary: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Alert {
    /// Fallback incident id for summaries not tied to a stored incident.
    #[must_use]
    pub fn synthetic_incident_id(&self) -> String {
        format!("INC-{}", self.alert_id.as_deref().unwrap_or("UNKNOWN"))
    }

    #[must_use]
    pub fn service_or_unknown(&self) -> &str {
        self.service.as_deref().unwrap_or("unknown")
    }

    /// Incident input for this alert; `default_type` fills a missing or blank type.
    #[must_use]
    pub fn to_new_incident(&self, default_type: &str) -> NewIncident {
        NewIncident {
            incident_type: self
                .incident_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| default_type.to_string()),
            service: self.service.clone(),
            signal: self.signal.clone(),
            impact: self.impact.clone().or_else(|| self.short_summary.clone()),
            region: self.region.clone(),
        }
    }
}
