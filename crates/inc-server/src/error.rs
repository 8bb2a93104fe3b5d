//! HTTP error mapping.
//!
//! Every crate's error converges here and leaves as
//! `{"error": code, "message": text}` with the matching status.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inc_agent::{ModelError, ToolError};
use inc_core::errors::CoreError;
use inc_db::error::{DatabaseError, ServiceError};
use inc_evidence::FixtureError;
use inc_search::SearchError;
use inc_slack::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Malformed request body or query string.
    #[error("{0}")]
    BadRequest(String),

    #[error("request exceeded {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Service(err.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

const INTERNAL: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "internal_error");

fn classify_service(err: &ServiceError) -> (StatusCode, &'static str) {
    match err {
        ServiceError::Core(CoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
        ServiceError::Core(CoreError::InvalidTransition { .. }) => {
            (StatusCode::CONFLICT, "invalid_transition")
        }
        ServiceError::Core(CoreError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, "validation_error")
        }
        ServiceError::Fixture(FixtureError::Missing { .. }) => {
            (StatusCode::NOT_FOUND, "missing_fixture")
        }
        ServiceError::Fixture(FixtureError::InvalidType(_)) => {
            (StatusCode::BAD_REQUEST, "validation_error")
        }
        ServiceError::Core(CoreError::Other(_))
        | ServiceError::Fixture(_)
        | ServiceError::Database(_) => INTERNAL,
    }
}

impl AppError {
    /// Status and machine-readable code.
    #[must_use]
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Service(err) => classify_service(err),
            Self::Search(SearchError::InvalidQuery(_)) => (StatusCode::BAD_REQUEST, "invalid_query"),
            Self::Search(SearchError::Database(err)) => classify_service(err),
            Self::Gateway(GatewayError::Auth(_)) => (StatusCode::UNAUTHORIZED, "auth_error"),
            Self::Gateway(GatewayError::NotConfigured(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "chat_not_configured")
            }
            Self::Gateway(GatewayError::ChatApi { .. } | GatewayError::Http(_)) => {
                (StatusCode::BAD_GATEWAY, "chat_api_error")
            }
            Self::Gateway(GatewayError::Payload(_)) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            Self::Gateway(GatewayError::Service(err)) => classify_service(err),
            Self::Timeout(_) => (StatusCode::REQUEST_TIMEOUT, "request_timeout"),
            Self::Internal(_) => INTERNAL,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, code, "request failed");
            "internal error".to_string()
        } else {
            if status.is_server_error() {
                tracing::warn!(error = %self, code, "upstream unavailable");
            } else {
                tracing::debug!(error = %self, code, "request rejected");
            }
            self.to_string()
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}

/// Failures while wiring the application at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Database(#[from] DatabaseError),

    #[error("failed to build tool registry: {0}")]
    Tools(#[from] ToolError),

    #[error("failed to build model client: {0}")]
    Model(#[from] ModelError),

    #[error("failed to build chat gateway: {0}")]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table() {
        let cases: Vec<(AppError, StatusCode, &str)> = vec![
            (
                CoreError::Validation("x".into()).into(),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                SearchError::InvalidQuery("empty".into()).into(),
                StatusCode::BAD_REQUEST,
                "invalid_query",
            ),
            (
                CoreError::not_found("incident", "INC-1").into(),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                ServiceError::Fixture(FixtureError::Missing {
                    incident_type: "x".into(),
                    file: "logs.json".into(),
                })
                .into(),
                StatusCode::NOT_FOUND,
                "missing_fixture",
            ),
            (
                ServiceError::Fixture(FixtureError::InvalidType(CoreError::Validation(
                    "incident type '../etc' contains invalid character '.'".into(),
                )))
                .into(),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                CoreError::InvalidTransition {
                    entity_type: "incident".into(),
                    id: "INC-1".into(),
                    from: "resolved".into(),
                    to: "assigned".into(),
                }
                .into(),
                StatusCode::CONFLICT,
                "invalid_transition",
            ),
            (
                GatewayError::Auth("mismatch".into()).into(),
                StatusCode::UNAUTHORIZED,
                "auth_error",
            ),
            (
                GatewayError::NotConfigured("no token".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                "chat_not_configured",
            ),
            (
                GatewayError::ChatApi {
                    method: "chat.postMessage".into(),
                    error: "channel_not_found".into(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
                "chat_api_error",
            ),
            (
                AppError::Timeout(Duration::from_secs(150)),
                StatusCode::REQUEST_TIMEOUT,
                "request_timeout",
            ),
            (
                ServiceError::Database(DatabaseError::Query("boom".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.classify(), (status, code), "{err}");
        }
    }
}
