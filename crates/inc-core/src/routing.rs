//! Incident-type routing: type validation, severity classification, and the
//! default owning teams.

use crate::entities::Owner;
use crate::enums::{OwnerRole, Severity};
use crate::errors::CoreError;

pub const PAYMENTS_FAILING: &str = "payments_failing";
pub const LOGIN_OUTAGE: &str = "login_outage";
pub const LATENCY_REGRESSION: &str = "latency_regression";

/// Normalize and validate an incident type tag.
///
/// The tag keys fixture lookup on disk, so only `[A-Za-z0-9_-]` is accepted.
///
/// # Errors
///
/// Returns `CoreError::Validation` for an empty tag or a disallowed character.
pub fn normalize_incident_type(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("incident type must not be empty".into()));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(CoreError::Validation(format!(
            "incident type '{trimmed}' contains invalid character '{bad}'"
        )));
    }
    Ok(trimmed.to_string())
}

#[must_use]
pub fn classify_severity(incident_type: &str) -> Severity {
    match incident_type {
        PAYMENTS_FAILING | LOGIN_OUTAGE => Severity::Sev1,
        LATENCY_REGRESSION => Severity::Sev2,
        _ => Severity::Sev3,
    }
}

/// Default owning teams: backend on-call is always primary.
#[must_use]
pub fn default_owners(incident_type: &str) -> Vec<Owner> {
    let secondary = match incident_type {
        PAYMENTS_FAILING => "Payments Team",
        LOGIN_OUTAGE => "Identity/Auth Team",
        _ => "Performance/Infra Team",
    };
    vec![
        Owner {
            team: "Backend Oncall".into(),
            role: OwnerRole::Primary,
        },
        Owner {
            team: secondary.into(),
            role: OwnerRole::Secondary,
        },
    ]
}
