//! Router and handlers.

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

mod agent;
mod approvals;
mod health;
mod incidents;
mod kb;
mod notes;
mod slack;

/// Build the HTTP router over `state`.
pub fn router(state: AppState) -> Router {
    let timeout = state.request_timeout();
    router_with_timeout(state, timeout)
}

/// Build the router with an explicit per-request timeout.
pub fn router_with_timeout(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/incidents", post(incidents::create).get(incidents::list))
        .route("/incidents/:id", get(incidents::fetch))
        .route("/incidents/:id/assign", post(incidents::assign))
        .route("/incidents/:id/resolve", post(incidents::resolve))
        .route("/incidents/:id/evidence", get(incidents::evidence))
        .route("/incidents/:id/notes", post(notes::add).get(notes::list))
        .route("/incident/start", post(incidents::start))
        .route("/kb/search", get(kb::search))
        .route("/approvals", post(approvals::enqueue))
        .route("/approvals/next", get(approvals::next))
        .route("/approvals/:id/decision", post(approvals::decide))
        .route("/slack/alert", post(slack::alert))
        .route("/slack/actions", post(slack::actions))
        .route("/agent/run", post(agent::run))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    middleware_error(&err, timeout)
                }))
                .timeout(timeout),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn middleware_error(err: &BoxError, timeout: Duration) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout(timeout)
    } else {
        AppError::Internal(err.to_string())
    }
}
