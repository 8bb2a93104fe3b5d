//! Language-model client seam.
//!
//! [`ModelClient`] is the only thing the agent loop knows about the model.
//! [`OpenAiClient`] speaks the Responses API over `reqwest`; tests drive the
//! loop with scripted clients instead.

use std::time::Duration;

use async_trait::async_trait;
use inc_config::OpenAiConfig;
use serde::Serialize;
use serde_json::Value;

use crate::error::ModelError;

/// One request to the Responses endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub input: Vec<Value>,
    pub tools: Vec<Value>,
}

/// A language model reachable over some transport.
///
/// Implementations return the raw response body; shape checks happen in the
/// agent loop so every transport fails the same way on malformed output.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn respond(&self, request: &ModelRequest) -> Result<Value, ModelError>;
}

/// Responses API client.
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotConfigured`] without an API key, or
    /// [`ModelError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, ModelError> {
        if !config.is_configured() {
            return Err(ModelError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .user_agent("incd/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.responses_url(),
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn respond(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        tracing::debug!(url = %self.url, items = request.input.len(), "calling model");
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ModelError::Parse(e.to_string()))
    }
}

/// Map a non-success status to [`ModelError::Api`] with the response body.
///
/// # Errors
///
/// Returns [`ModelError::Api`] for any non-2xx status.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ModelError> {
    if !resp.status().is_success() {
        return Err(ModelError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}
