use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use inc_core::entities::{Alert, EvidenceBundle, Incident, NewIncident};
use inc_core::summary::IncidentSummary;
use inc_evidence::{SummaryContext, summarize_fixtures};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    assignee: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    incident: Incident,
    summary: IncidentSummary,
}

#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewIncident>, JsonRejection>,
) -> Result<(StatusCode, Json<Incident>), AppError> {
    let Json(input) = payload?;
    let incident = state.service.create_incident(input).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Incident>>, AppError> {
    let Query(params) = params?;
    let incidents = state
        .service
        .list_incidents(params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await?;
    Ok(Json(incidents))
}

pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Incident>, AppError> {
    Ok(Json(state.service.get_incident(&id).await?))
}

#[tracing::instrument(skip(state, payload))]
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AssignBody>, JsonRejection>,
) -> Result<Json<Incident>, AppError> {
    let Json(body) = payload?;
    Ok(Json(state.service.assign_incident(&id, &body.assignee).await?))
}

#[tracing::instrument(skip(state))]
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Incident>, AppError> {
    Ok(Json(state.service.resolve_incident(&id).await?))
}

#[tracing::instrument(skip(state))]
pub async fn evidence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EvidenceBundle>, AppError> {
    Ok(Json(state.service.get_evidence(&id).await?))
}

/// Create an incident from an alert and summarize its fixtures in one call.
#[tracing::instrument(skip_all)]
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<Alert>, JsonRejection>,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    let Json(alert) = payload?;
    let incident = state
        .service
        .create_incident(alert.to_new_incident(&state.config.agent.default_incident_type))
        .await?;
    let ctx = SummaryContext::for_incident(&incident, Some(&alert));
    let summary = summarize_fixtures(
        state.service.fixtures(),
        &incident.incident_type,
        &ctx,
        state.config.agent.next_update_minutes,
    )
    .await;
    tracing::info!(incident_id = %incident.id, status = %summary.status, "incident started");
    Ok((StatusCode::CREATED, Json(StartResponse { incident, summary })))
}
