use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_configured": state.agent.has_model(),
        "chat_configured": state.gateway.is_configured(),
    }))
}
