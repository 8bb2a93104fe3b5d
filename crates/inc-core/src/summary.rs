//! The structured incident summary returned by the agent loop and the
//! fixture-only runner, and posted to the chat channel.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Severity, SummaryStatus};

/// Default minutes until the next status update.
pub const DEFAULT_NEXT_UPDATE_MINUTES: u32 = 15;

/// Key evidence figures extracted into the summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SummaryEvidence {
    #[serde(default)]
    pub metrics_window: Option<String>,
    #[serde(default)]
    pub error_rate: Option<f64>,
    #[serde(default)]
    pub p95_latency_ms: Option<f64>,
    #[serde(default)]
    pub upstream_timeout_rate: Option<f64>,
    #[serde(default)]
    pub request_rate_rps: Option<f64>,
    #[serde(default)]
    pub log_window: Option<String>,
    #[serde(default)]
    pub log_highlights: Vec<String>,
    #[serde(default)]
    pub recent_changes: Vec<String>,
    #[serde(default)]
    pub runbook_title: Option<String>,
}

/// Final structured summary of an incident run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct IncidentSummary {
    pub incident_id: String,
    pub status: SummaryStatus,
    pub severity: Severity,
    pub service: String,
    pub summary: String,
    #[serde(default)]
    pub evidence: SummaryEvidence,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default)]
    pub suggested_mitigations: Vec<String>,
    #[serde(default = "default_next_update")]
    pub next_update_minutes: u32,
    /// Failure reason when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

const fn default_next_update() -> u32 {
    DEFAULT_NEXT_UPDATE_MINUTES
}

impl IncidentSummary {
    /// A `failed` summary carrying only identification and a reason.
    pub fn failed(
        incident_id: impl Into<String>,
        severity: Severity,
        service: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            incident_id: incident_id.into(),
            status: SummaryStatus::Failed,
            severity,
            service: service.into(),
            summary: String::new(),
            evidence: SummaryEvidence::default(),
            recommended_actions: Vec::new(),
            suggested_mitigations: Vec::new(),
            next_update_minutes: DEFAULT_NEXT_UPDATE_MINUTES,
            reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, SummaryStatus::Failed)
    }
}
