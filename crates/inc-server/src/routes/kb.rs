use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use inc_search::{KbQuery, KbSearchResponse, kb_search};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query string of `/kb/search`. A missing `q` is searched as empty so it
/// fails as `invalid_query` rather than as a malformed request.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    k: Option<u32>,
    #[serde(default)]
    incident_type: Option<String>,
    #[serde(default)]
    service: Option<String>,
}

impl From<SearchParams> for KbQuery {
    fn from(params: SearchParams) -> Self {
        Self {
            q: params.q,
            k: params.k,
            incident_type: params.incident_type,
            service: params.service,
        }
    }
}

#[tracing::instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<KbSearchResponse>, AppError> {
    let Query(params) = params?;
    let response = kb_search(&state.service, &params.into()).await?;
    Ok(Json(response))
}
