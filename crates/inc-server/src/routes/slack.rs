use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use inc_core::entities::{Alert, ApprovalRequest, Incident};
use inc_slack::{
    ActionHeaders, ActionOutcome, GatewayError, MessageRef, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AlertSent {
    status: &'static str,
    incident: Incident,
    approval: ApprovalRequest,
    message: MessageRef,
}

/// Post an interactive alert for an existing incident (`incident_id`) or
/// for a new one created from the alert fields.
#[tracing::instrument(skip_all)]
pub async fn alert(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AlertSent>, AppError> {
    let Json(mut body) = payload?;
    if !state.gateway.is_configured() {
        return Err(GatewayError::NotConfigured("bot token or channel missing".into()).into());
    }
    let Some(fields) = body.as_object_mut() else {
        return Err(AppError::BadRequest("alert body must be a JSON object".into()));
    };
    let incident_id = fields
        .remove("incident_id")
        .and_then(|v| v.as_str().map(str::to_string));

    let incident = if let Some(id) = incident_id {
        state.service.get_incident(&id).await?
    } else {
        let alert: Alert = serde_json::from_value(body.clone())
            .map_err(|e| AppError::BadRequest(format!("invalid alert: {e}")))?;
        state
            .service
            .create_incident(alert.to_new_incident(&state.config.agent.default_incident_type))
            .await?
    };

    let posted = state.gateway.post_alert(&incident, &body).await?;
    Ok(Json(AlertSent {
        status: "sent",
        incident,
        approval: posted.approval,
        message: posted.message,
    }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Signed interactive callback.
#[tracing::instrument(skip_all)]
pub async fn actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ActionOutcome>, AppError> {
    let outcome = state
        .gateway
        .handle_action(
            ActionHeaders {
                timestamp: header(&headers, TIMESTAMP_HEADER),
                signature: header(&headers, SIGNATURE_HEADER),
            },
            &body,
        )
        .await?;
    Ok(Json(outcome))
}
