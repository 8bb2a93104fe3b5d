//! Message text and Block Kit layouts.

use std::fmt::Write as _;

use inc_core::entities::Incident;
use inc_core::summary::IncidentSummary;
use serde_json::{Value, json};

pub const INITIATE_ACTION: &str = "initiate_incident";
pub const IGNORE_ACTION: &str = "ignore_alert";

fn alert_str<'a>(alert: &'a Value, key: &str) -> Option<&'a str> {
    alert
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Interactive alert message: a summary section and the two decision
/// buttons. Both buttons carry `{approval_id, alert}` as their value.
#[must_use]
pub fn alert_blocks(incident: &Incident, alert: &Value, approval_id: &str) -> Vec<Value> {
    let service = alert_str(alert, "service").unwrap_or(&incident.service);
    let severity = alert_str(alert, "severity").unwrap_or_else(|| incident.severity.as_str());
    let summary = alert_str(alert, "short_summary")
        .or(incident.impact.as_deref())
        .unwrap_or("-");
    let time = alert_str(alert, "timestamp")
        .or_else(|| alert_str(alert, "start_time"))
        .map_or_else(|| incident.created_at.to_rfc3339(), str::to_string);

    let value = json!({"approval_id": approval_id, "alert": alert}).to_string();
    vec![
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*🚨 Incident Alert Detected*\n\n\
                     *Incident:* `{}`\n\
                     *Service:* {service}\n\
                     *Severity:* {severity}\n\
                     *Summary:* {summary}\n\
                     *Time:* {time}",
                    incident.id
                ),
            },
        }),
        json!({
            "type": "actions",
            "elements": [
                {
                    "type": "button",
                    "text": {"type": "plain_text", "text": "Initiate Incident Response"},
                    "style": "primary",
                    "value": value,
                    "action_id": INITIATE_ACTION,
                },
                {
                    "type": "button",
                    "text": {"type": "plain_text", "text": "Ignore Alert"},
                    "style": "danger",
                    "value": value,
                    "action_id": IGNORE_ACTION,
                },
            ],
        }),
    ]
}

fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn num(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn text_or_na(value: Option<&str>) -> &str {
    value.unwrap_or("n/a")
}

fn bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("• (none)\n");
        return;
    }
    for item in items {
        let _ = writeln!(out, "• {item}");
    }
}

/// Thread reply for a completed run.
#[must_use]
pub fn format_summary(summary: &IncidentSummary) -> String {
    let ev = &summary.evidence;
    let mut out = String::new();
    let _ = writeln!(out, "*🧩 Incident Started:* `{}`", summary.incident_id);
    let _ = writeln!(out, "*Service:* {}", summary.service);
    let _ = writeln!(out, "*Severity:* {}", summary.severity);
    let _ = writeln!(out, "*Summary:* {}\n", summary.summary);

    out.push_str("*📈 Evidence (Metrics)*\n");
    let _ = writeln!(out, "• Window: {}", text_or_na(ev.metrics_window.as_deref()));
    let _ = writeln!(out, "• Error rate: {}", pct(ev.error_rate));
    let _ = writeln!(out, "• P95 latency (ms): {}", num(ev.p95_latency_ms));
    let _ = writeln!(out, "• Upstream timeout rate: {}", pct(ev.upstream_timeout_rate));
    let _ = writeln!(out, "• Request rate (rps): {}", num(ev.request_rate_rps));
    let _ = writeln!(out, "• Runbook: {}\n", text_or_na(ev.runbook_title.as_deref()));

    out.push_str("*🧾 Recent Changes*\n");
    bullets(&mut out, &ev.recent_changes);
    let _ = writeln!(
        out,
        "\n*📜 Log Highlights ({})*",
        text_or_na(ev.log_window.as_deref())
    );
    bullets(&mut out, &ev.log_highlights);
    out.push_str("\n*✅ Recommended Actions*\n");
    bullets(&mut out, &summary.recommended_actions);
    out.push_str("\n*🛠️ Suggested Mitigations*\n");
    bullets(&mut out, &summary.suggested_mitigations);
    let _ = write!(
        out,
        "\nNext update in *{} minutes*. 🔁",
        summary.next_update_minutes
    );
    out
}

#[must_use]
pub fn failure_text(alert_id: &str, reason: &str) -> String {
    format!("❌ Incident workflow failed for `{alert_id}`: {reason} 🛑")
}

#[must_use]
pub fn acknowledgement_text(user_id: &str, alert_id: &str) -> String {
    format!("🚀 <@{user_id}> approved `{alert_id}`. Running incident workflow now… ⏳")
}

#[must_use]
pub fn ignored_text(user_id: &str, alert_id: &str) -> String {
    format!("<@{user_id}> ignored alert `{alert_id}`. No incident started. 🧾")
}

#[must_use]
pub fn already_decided_text(alert_id: &str, state: &str) -> String {
    format!("ℹ️ Alert `{alert_id}` was already {state}. No action taken.")
}

#[must_use]
pub fn unknown_action_text(action_id: &str) -> String {
    format!("⚠️ Unknown action `{action_id}` received. 🤔")
}
