use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use inc_agent::AgentReport;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    alert: Value,
    #[serde(default)]
    incident_id: Option<String>,
}

/// Run the agent loop on an alert. Model failures fall back to fixtures, so
/// this only fails on a malformed request.
#[tracing::instrument(skip_all)]
pub async fn run(
    State(state): State<AppState>,
    payload: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<AgentReport>, AppError> {
    let Json(request) = payload?;
    if !request.alert.is_object() {
        return Err(AppError::BadRequest("alert must be a JSON object".into()));
    }
    let report = state
        .agent
        .run(&request.alert, request.incident_id.as_deref())
        .await;
    Ok(Json(report))
}
