//! Gateway error types.

use inc_db::error::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound callback failed signature verification.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No bot token or channel is configured.
    #[error("chat is not configured: {0}")]
    NotConfigured(String),

    /// The chat API answered with `ok: false` or a non-success status.
    #[error("chat API error calling {method}: {error}")]
    ChatApi { method: String, error: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The callback body or button value could not be decoded.
    #[error("invalid action payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl GatewayError {
    pub(crate) fn payload(message: impl Into<String>) -> Self {
        Self::Payload(message.into())
    }
}
