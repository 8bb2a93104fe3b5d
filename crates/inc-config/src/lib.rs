//! # inc-config
//!
//! Layered configuration loading for the incident response service using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`INCIDENT_*` prefix, `__` as separator)
//! 2. Conventional provider variables (`OPENAI_API_KEY`, `SLACK_BOT_TOKEN`, ...)
//! 3. Project-level `incident.toml`
//! 4. User-level `~/.config/incident/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `INCIDENT_OPENAI__MODEL` -> `openai.model`,
//! `INCIDENT_AGENT__MAX_TOOL_CALLS` -> `agent.max_tool_calls`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use inc_config::IncidentConfig;
//!
//! let config = IncidentConfig::load_with_dotenv().expect("config");
//!
//! if !config.openai.is_configured() {
//!     println!("agent runs in fixture-only mode");
//! }
//! ```

mod agent;
mod error;
mod openai;
mod server;
mod slack;

pub use agent::AgentConfig;
pub use error::ConfigError;
pub use openai::OpenAiConfig;
pub use server::ServerConfig;
pub use slack::SlackConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Conventional variable names and the config paths they fill.
const PROVIDER_ENV: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "openai.api_key"),
    ("OPENAI_MODEL", "openai.model"),
    ("OPENAI_BASE_URL", "openai.base_url"),
    ("OPENAI_TIMEOUT", "openai.timeout_secs"),
    ("SLACK_BOT_TOKEN", "slack.bot_token"),
    ("SLACK_SIGNING_SECRET", "slack.signing_secret"),
    ("SLACK_CHANNEL_ID", "slack.channel_id"),
];

const PROJECT_CONFIG_FILE: &str = "incident.toml";

/// Upper bound for any outbound HTTP timeout.
pub const MAX_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IncidentConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl IncidentConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source fails to parse, or
    /// `ConfigError::InvalidValue` if a budget or timeout is zero.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
            .merge(Self::provider_env())
            .merge(Env::prefixed("INCIDENT_").split("__"))
    }

    /// Reject values that would make the service unusable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::invalid("agent.max_iterations", "must be at least 1"));
        }
        if self.agent.max_tool_calls == 0 {
            return Err(ConfigError::invalid("agent.max_tool_calls", "must be at least 1"));
        }
        for (field, secs) in [
            ("openai.timeout_secs", self.openai.timeout_secs),
            ("slack.timeout_secs", self.slack.timeout_secs),
        ] {
            if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
                ));
            }
        }
        if self.agent.default_incident_type.trim().is_empty() {
            return Err(ConfigError::invalid(
                "agent.default_incident_type",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// The Slack section, if a bot token and channel are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` otherwise.
    pub fn require_slack(&self) -> Result<&SlackConfig, ConfigError> {
        if self.slack.is_configured() {
            Ok(&self.slack)
        } else {
            Err(ConfigError::NotConfigured {
                section: "slack".into(),
            })
        }
    }

    /// Unprefixed provider variables mapped onto their config paths.
    fn provider_env() -> Env {
        Env::raw().filter_map(|key| {
            PROVIDER_ENV
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, path)| (*path).into())
        })
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("incident").join("config.toml"))
    }
}
