use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use inc_core::entities::{NewNote, Note};

use crate::error::AppError;
use crate::state::AppState;

#[tracing::instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewNote>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let Json(input) = payload?;
    let note = state.service.add_note(&id, input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.service.list_notes(&id).await?))
}
