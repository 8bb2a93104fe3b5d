//! Language-model API configuration.

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    /// API key. Empty disables the external agent path.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL without the trailing endpoint (`/responses` is appended).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bound on a single model call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    /// Check if a credential is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Full URL of the Responses endpoint.
    #[must_use]
    pub fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }
}
