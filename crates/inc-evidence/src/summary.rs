//! Deterministic incident summary built from fixtures alone.

use inc_core::entities::{Alert, Evidence, Incident};
use inc_core::enums::{Severity, SummaryStatus};
use inc_core::routing::classify_severity;
use inc_core::summary::{IncidentSummary, SummaryEvidence};
use serde_json::Value;

use crate::error::FixtureError;
use crate::store::FixtureStore;

const LOG_HIGHLIGHTS: usize = 3;
const RECENT_CHANGES: usize = 3;
const RECOMMENDED_ACTIONS: usize = 4;
const MITIGATIONS: usize = 3;

/// Identification carried into the summary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryContext {
    pub incident_id: String,
    pub severity: Severity,
    pub service: String,
    pub summary: String,
}

impl SummaryContext {
    /// Header derived from an alert; severity falls back to the type's class.
    #[must_use]
    pub fn from_alert(alert: &Alert, incident_type: &str) -> Self {
        Self {
            incident_id: alert.synthetic_incident_id(),
            severity: alert
                .severity
                .unwrap_or_else(|| classify_severity(incident_type)),
            service: alert.service_or_unknown().to_string(),
            summary: alert.short_summary.clone().unwrap_or_default(),
        }
    }

    /// Header for a stored incident, keeping the alert's narrative if given.
    #[must_use]
    pub fn for_incident(incident: &Incident, alert: Option<&Alert>) -> Self {
        Self {
            incident_id: incident.id.clone(),
            severity: incident.severity,
            service: incident.service.clone(),
            summary: alert
                .and_then(|a| a.short_summary.clone())
                .or_else(|| incident.impact.clone())
                .unwrap_or_default(),
        }
    }
}

/// Load fixtures for `incident_type` and summarize them.
///
/// Never fails: a missing or unreadable fixture set yields a summary with
/// `status: failed` and a reason.
pub async fn summarize_fixtures(
    store: &FixtureStore,
    incident_type: &str,
    ctx: &SummaryContext,
    next_update_minutes: u32,
) -> IncidentSummary {
    match store.load(incident_type).await {
        Ok(evidence) => summarize_evidence(&evidence, ctx, next_update_minutes),
        Err(err) => {
            tracing::warn!(%incident_type, error = %err, "fixture summary unavailable");
            let reason = match err {
                FixtureError::Missing { .. } | FixtureError::InvalidType(_) => {
                    format!("Unknown incident_type '{incident_type}' (no fixtures found).")
                }
                other => other.to_string(),
            };
            let mut summary =
                IncidentSummary::failed(&ctx.incident_id, ctx.severity, &ctx.service, reason);
            summary.next_update_minutes = next_update_minutes;
            summary
        }
    }
}

/// Summarize already-loaded evidence.
#[must_use]
pub fn summarize_evidence(
    evidence: &Evidence,
    ctx: &SummaryContext,
    next_update_minutes: u32,
) -> IncidentSummary {
    let steps: Vec<String> = evidence
        .runbook
        .get("steps")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let recommended_actions = steps.iter().take(RECOMMENDED_ACTIONS).cloned().collect();
    let suggested_mitigations = steps
        .iter()
        .filter(|s| s.to_lowercase().starts_with("mitigation"))
        .take(MITIGATIONS)
        .cloned()
        .collect();

    IncidentSummary {
        incident_id: ctx.incident_id.clone(),
        status: SummaryStatus::InProgress,
        severity: ctx.severity,
        service: ctx.service.clone(),
        summary: ctx.summary.clone(),
        evidence: SummaryEvidence {
            metrics_window: string_field(&evidence.metrics, "time_range"),
            error_rate: number_field(&evidence.metrics, "error_rate"),
            p95_latency_ms: number_field(&evidence.metrics, "p95_latency_ms"),
            upstream_timeout_rate: number_field(&evidence.metrics, "upstream_timeout_rate"),
            request_rate_rps: number_field(&evidence.metrics, "request_rate_rps"),
            log_window: string_field(&evidence.logs, "window"),
            log_highlights: log_highlights(&evidence.logs),
            recent_changes: recent_changes(&evidence.changes),
            runbook_title: string_field(&evidence.runbook, "runbook_title"),
        },
        recommended_actions,
        suggested_mitigations,
        next_update_minutes,
        reason: None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

/// Rank of a log line: ERROR before WARN before INFO before anything else.
fn log_rank(line: &str) -> u8 {
    if line.contains(" ERROR ") {
        0
    } else if line.contains(" WARN ") {
        1
    } else if line.contains(" INFO ") {
        2
    } else {
        u8::MAX
    }
}

fn log_highlights(logs: &Value) -> Vec<String> {
    let mut lines: Vec<&str> = logs
        .get("lines")
        .and_then(Value::as_array)
        .map(|lines| lines.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    // stable: equal ranks keep file order
    lines.sort_by_key(|line| log_rank(line));
    lines
        .into_iter()
        .take(LOG_HIGHLIGHTS)
        .map(|l| l.trim().to_string())
        .collect()
}

fn recent_changes(changes: &Value) -> Vec<String> {
    changes
        .get("recent_changes")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(RECENT_CHANGES)
                .map(|c| {
                    let ts = c.get("ts").and_then(Value::as_str).unwrap_or("?");
                    let kind = c.get("type").and_then(Value::as_str).unwrap_or("?");
                    let summary = c.get("summary").and_then(Value::as_str).unwrap_or("");
                    format!("{ts} [{kind}] {summary}").trim().to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}
