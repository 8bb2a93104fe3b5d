//! Chat Web API client.

use std::time::Duration;

use async_trait::async_trait;
use inc_config::SlackConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// An outgoing `chat.postMessage` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub channel: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Value>>,
}

impl ChatMessage {
    pub fn text(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
            thread_ts: None,
            blocks: None,
        }
    }

    #[must_use]
    pub fn in_thread(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }
}

/// Where a posted message landed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn post_message(&self, message: &ChatMessage) -> Result<MessageRef, GatewayError>;
}

/// Envelope every Web API method returns.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Bot-token client for the Slack Web API.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConfigured`] without a bot token, or
    /// [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SlackConfig) -> Result<Self, GatewayError> {
        if config.bot_token.is_empty() {
            return Err(GatewayError::NotConfigured("bot token is empty".into()));
        }
        let http = reqwest::Client::builder()
            .user_agent("incd/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }
}

#[async_trait]
impl ChatClient for SlackClient {
    async fn post_message(&self, message: &ChatMessage) -> Result<MessageRef, GatewayError> {
        const METHOD: &str = "chat.postMessage";
        let resp = self
            .http
            .post(self.method_url(METHOD))
            .bearer_auth(&self.token)
            .json(message)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::ChatApi {
                method: METHOD.into(),
                error: format!("HTTP {}", resp.status().as_u16()),
            });
        }
        let envelope: ApiEnvelope = resp.json().await?;
        parse_envelope(METHOD, envelope, &message.channel)
    }
}

fn parse_envelope(
    method: &str,
    envelope: ApiEnvelope,
    fallback_channel: &str,
) -> Result<MessageRef, GatewayError> {
    if !envelope.ok {
        return Err(GatewayError::ChatApi {
            method: method.to_string(),
            error: envelope.error.unwrap_or_else(|| "unknown_error".into()),
        });
    }
    Ok(MessageRef {
        channel: envelope
            .channel
            .unwrap_or_else(|| fallback_channel.to_string()),
        ts: envelope.ts.unwrap_or_default(),
    })
}
