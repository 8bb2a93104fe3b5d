//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use inc_agent::{AgentLoop, ToolRegistry};
use inc_config::IncidentConfig;
use inc_db::service::IncidentService;
use inc_slack::AlertGateway;

use crate::error::StartupError;

/// Slack for the HTTP request timeout on top of the agent's worst case.
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 30;

/// Immutable state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IncidentConfig>,
    pub service: Arc<IncidentService>,
    pub agent: Arc<AgentLoop>,
    pub gateway: Arc<AlertGateway>,
}

impl AppState {
    /// Open storage and wire the agent and gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the database cannot be opened, a tool
    /// schema does not compile, or an HTTP client cannot be built.
    pub async fn build(config: IncidentConfig) -> Result<Self, StartupError> {
        let service = Arc::new(
            IncidentService::new_local(&config.server.database_path, &config.server.fixtures_dir)
                .await?,
        );
        Self::with_service(config, service)
    }

    /// Wire everything around an already-open service.
    ///
    /// # Errors
    ///
    /// See [`AppState::build`].
    pub fn with_service(
        config: IncidentConfig,
        service: Arc<IncidentService>,
    ) -> Result<Self, StartupError> {
        let registry = Arc::new(ToolRegistry::new(service.clone())?);
        tracing::debug!(tools = ?registry.names(), "tool registry compiled");
        let agent = Arc::new(AgentLoop::from_config(registry, &config)?);
        let gateway = Arc::new(AlertGateway::from_config(
            service.clone(),
            agent.clone(),
            &config.slack,
        )?);
        Ok(Self::new(config, service, agent, gateway))
    }

    #[must_use]
    pub fn new(
        config: IncidentConfig,
        service: Arc<IncidentService>,
        agent: Arc<AgentLoop>,
        gateway: Arc<AlertGateway>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            service,
            agent,
            gateway,
        }
    }

    /// Upper bound for one HTTP request: every model round trip timing out,
    /// plus a margin for tools and chat calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let agent = &self.config.agent;
        let per_call = self.config.openai.timeout_secs;
        Duration::from_secs(
            per_call
                .saturating_mul(u64::from(agent.max_iterations))
                .saturating_add(REQUEST_TIMEOUT_MARGIN_SECS),
        )
    }
}
