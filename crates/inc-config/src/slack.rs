//! Slack configuration.

use serde::{Deserialize, Serialize};

fn default_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

/// Maximum accepted age of a signed request, in seconds.
const fn default_signature_tolerance_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`) used for `chat.postMessage`.
    #[serde(default)]
    pub bot_token: String,

    /// Signing secret used to verify interactive callbacks.
    #[serde(default)]
    pub signing_secret: String,

    /// Channel that receives alerts.
    #[serde(default)]
    pub channel_id: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_signature_tolerance_secs")]
    pub signature_tolerance_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            signing_secret: String::new(),
            channel_id: String::new(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            signature_tolerance_secs: default_signature_tolerance_secs(),
        }
    }
}

impl SlackConfig {
    /// Check if messages can be posted (token and channel present).
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.channel_id.is_empty()
    }

    /// Check if interactive callbacks can be verified.
    #[must_use]
    pub fn can_verify(&self) -> bool {
        !self.signing_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = SlackConfig::default();
        assert!(!config.is_configured());
        assert!(!config.can_verify());
        assert_eq!(config.signature_tolerance_secs, 300);
    }

    #[test]
    fn token_alone_is_not_enough() {
        let config = SlackConfig {
            bot_token: "xoxb-1".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());

        let config = SlackConfig {
            channel_id: "C123".into(),
            ..config
        };
        assert!(config.is_configured());
    }
}
