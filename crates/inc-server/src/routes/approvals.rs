use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use inc_core::entities::{ApprovalRequest, NewApproval};
use inc_core::enums::ApprovalState;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NextApproval {
    has_item: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<ApprovalRequest>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    decision: ApprovalState,
    #[serde(default)]
    decided_by: Option<String>,
}

#[tracing::instrument(skip_all)]
pub async fn enqueue(
    State(state): State<AppState>,
    payload: Result<Json<NewApproval>, JsonRejection>,
) -> Result<(StatusCode, Json<ApprovalRequest>), AppError> {
    let Json(input) = payload?;
    let approval = state.service.enqueue_approval(input).await?;
    Ok((StatusCode::CREATED, Json(approval)))
}

/// Peek at the oldest pending approval.
pub async fn next(State(state): State<AppState>) -> Result<Json<NextApproval>, AppError> {
    let item = state.service.next_pending_approval().await?;
    Ok(Json(NextApproval {
        has_item: item.is_some(),
        item,
    }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn decide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DecisionBody>, JsonRejection>,
) -> Result<Json<ApprovalRequest>, AppError> {
    let Json(body) = payload?;
    let approval = state
        .service
        .decide_approval(&id, body.decision, body.decided_by.as_deref())
        .await?;
    Ok(Json(approval))
}
