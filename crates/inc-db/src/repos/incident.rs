//! Incident repository: create, fetch, list, assign, resolve, evidence.

use chrono::Utc;

use inc_core::entities::{EvidenceBundle, Incident, NewIncident};
use inc_core::enums::IncidentStatus;
use inc_core::errors::CoreError;
use inc_core::ids::PREFIX_INCIDENT;
use inc_core::routing::{classify_severity, default_owners, normalize_incident_type};

use crate::error::{DatabaseError, ServiceError};
use crate::helpers::{
    get_opt_string, non_blank, parse_datetime, parse_enum, state_guard, to_json_text,
};
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_type, status, assignee, severity, service, signal, impact, region, owners, created_at, updated_at";

/// Upper bound for `list_incidents`.
pub const MAX_LIST_LIMIT: u32 = 200;

fn row_to_incident(row: &libsql::Row) -> Result<Incident, DatabaseError> {
    let owners = serde_json::from_str(&row.get::<String>(9)?)
        .map_err(|e| DatabaseError::Query(format!("Invalid owners JSON: {e}")))?;
    Ok(Incident {
        id: row.get(0)?,
        incident_type: row.get(1)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        assignee: get_opt_string(row, 3)?,
        severity: parse_enum(&row.get::<String>(4)?)?,
        service: row.get(5)?,
        signal: get_opt_string(row, 6)?,
        impact: get_opt_string(row, 7)?,
        region: get_opt_string(row, 8)?,
        owners,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

impl IncidentService {
    /// Create an incident in status `open`.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` if the type is empty or has characters outside
    /// `[A-Za-z0-9_-]`.
    pub async fn create_incident(&self, input: NewIncident) -> Result<Incident, ServiceError> {
        let incident_type = normalize_incident_type(&input.incident_type)?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_INCIDENT).await?;

        let incident = Incident {
            id,
            severity: classify_severity(&incident_type),
            owners: default_owners(&incident_type),
            incident_type,
            status: IncidentStatus::Open,
            assignee: None,
            service: non_blank(input.service.as_deref()).unwrap_or_else(|| "unknown".into()),
            signal: non_blank(input.signal.as_deref()),
            impact: non_blank(input.impact.as_deref()),
            region: non_blank(input.region.as_deref()),
            created_at: now,
            updated_at: now,
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO incidents (id, incident_type, status, assignee, severity, service, signal, impact, region, owners, created_at, updated_at)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                libsql::params![
                    incident.id.as_str(),
                    incident.incident_type.as_str(),
                    incident.status.as_str(),
                    incident.severity.as_str(),
                    incident.service.as_str(),
                    incident.signal.as_deref(),
                    incident.impact.as_deref(),
                    incident.region.as_deref(),
                    to_json_text(&incident.owners)?,
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        tracing::info!(
            incident_id = %incident.id,
            incident_type = %incident.incident_type,
            severity = %incident.severity,
            "incident created"
        );
        Ok(incident)
    }

    /// # Errors
    ///
    /// `CoreError::NotFound` if no incident has this id.
    pub async fn get_incident(&self, id: &str) -> Result<Incident, ServiceError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM incidents WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("incident", id))?;
        Ok(row_to_incident(&row)?)
    }

    /// Most recent incidents first. `limit` is clamped to `1..=200`.
    pub async fn list_incidents(&self, limit: u32) -> Result<Vec<Incident>, ServiceError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM incidents ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;

        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(row_to_incident(&row)?);
        }
        Ok(incidents)
    }

    /// Set the assignee.
    ///
    /// `open` becomes `assigned`; an `assigned` incident gets its assignee
    /// replaced. A `resolved` incident is never touched: the update is a
    /// single statement guarded on [`IncidentStatus::assignable`].
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` for a blank assignee.
    /// - `CoreError::NotFound` for an unknown id.
    /// - `CoreError::InvalidTransition` if the incident is resolved.
    pub async fn assign_incident(&self, id: &str, assignee: &str) -> Result<Incident, ServiceError> {
        let assignee = assignee.trim();
        if assignee.is_empty() {
            return Err(CoreError::Validation("assignee must not be empty".into()).into());
        }

        let guard = state_guard(
            "status",
            IncidentStatus::assignable()
                .into_iter()
                .map(IncidentStatus::as_str),
        );
        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE incidents SET assignee = ?1, status = ?2, updated_at = ?3
                     WHERE id = ?4 AND {guard}"
                ),
                libsql::params![
                    assignee,
                    IncidentStatus::Assigned.as_str(),
                    now.to_rfc3339(),
                    id
                ],
            )
            .await?;

        if changed == 0 {
            return Err(self.rejected_transition(id, IncidentStatus::Assigned).await);
        }

        tracing::info!(incident_id = id, assignee, "incident assigned");
        self.get_incident(id).await
    }

    /// Move an `open` or `assigned` incident to `resolved`.
    ///
    /// # Errors
    ///
    /// - `CoreError::NotFound` for an unknown id.
    /// - `CoreError::InvalidTransition` if already resolved.
    pub async fn resolve_incident(&self, id: &str) -> Result<Incident, ServiceError> {
        let guard = state_guard(
            "status",
            IncidentStatus::sources_of(IncidentStatus::Resolved)
                .into_iter()
                .map(IncidentStatus::as_str),
        );
        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE incidents SET status = ?1, updated_at = ?2
                     WHERE id = ?3 AND {guard}"
                ),
                libsql::params![IncidentStatus::Resolved.as_str(), now.to_rfc3339(), id],
            )
            .await?;

        if changed == 0 {
            return Err(self.rejected_transition(id, IncidentStatus::Resolved).await);
        }

        tracing::info!(incident_id = id, "incident resolved");
        self.get_incident(id).await
    }

    /// Evidence for the incident, looked up by its type.
    ///
    /// # Errors
    ///
    /// - `CoreError::NotFound` for an unknown id.
    /// - `FixtureError::Missing` if the type has no complete fixture set.
    pub async fn get_evidence(&self, id: &str) -> Result<EvidenceBundle, ServiceError> {
        let incident = self.get_incident(id).await?;
        let evidence = self.fixtures().load(&incident.incident_type).await?;
        Ok(EvidenceBundle {
            incident_id: incident.id,
            incident_type: incident.incident_type,
            service: incident.service,
            region: incident.region,
            evidence,
        })
    }

    /// Explain why a guarded status update touched no row.
    async fn rejected_transition(&self, id: &str, to: IncidentStatus) -> ServiceError {
        match self.get_incident(id).await {
            Ok(current) => CoreError::InvalidTransition {
                entity_type: "incident".into(),
                id: id.to_string(),
                from: current.status.to_string(),
                to: to.to_string(),
            }
            .into(),
            Err(err) => err,
        }
    }
}
