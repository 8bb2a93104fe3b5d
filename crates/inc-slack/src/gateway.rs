//! Alert posting and interactive callback handling.

use std::sync::Arc;
use std::time::Duration;

use inc_agent::{AgentLoop, AgentReport};
use inc_config::SlackConfig;
use inc_core::entities::{ApprovalRequest, Incident, NewApproval};
use inc_core::enums::ApprovalState;
use inc_db::service::IncidentService;
use serde::Serialize;
use serde_json::Value;

use crate::action::{ButtonValue, parse_form_payload};
use crate::client::{ChatClient, ChatMessage, MessageRef, SlackClient};
use crate::error::GatewayError;
use crate::format::{
    IGNORE_ACTION, INITIATE_ACTION, acknowledgement_text, alert_blocks, already_decided_text,
    failure_text, format_summary, ignored_text, unknown_action_text,
};
use crate::signature::SignatureVerifier;

/// Result of [`AlertGateway::post_alert`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostedAlert {
    pub approval: ApprovalRequest,
    pub message: MessageRef,
}

/// What an interactive callback did.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Initiated {
        approval_id: Option<String>,
        report: AgentReport,
    },
    Ignored {
        approval_id: Option<String>,
    },
    AlreadyDecided {
        approval_id: String,
        state: ApprovalState,
    },
    UnknownAction {
        action_id: String,
    },
}

/// Raw signature headers of a callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionHeaders<'a> {
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
}

enum Decision {
    Decided(Option<ApprovalRequest>),
    AlreadyDecided(ApprovalRequest),
}

/// Posts interactive alerts and relays button clicks into approvals and the
/// agent loop.
pub struct AlertGateway {
    service: Arc<IncidentService>,
    agent: Arc<AgentLoop>,
    chat: Option<Arc<dyn ChatClient>>,
    channel_id: String,
    verifier: Option<SignatureVerifier>,
}

impl AlertGateway {
    pub fn new(
        service: Arc<IncidentService>,
        agent: Arc<AgentLoop>,
        chat: Option<Arc<dyn ChatClient>>,
        channel_id: impl Into<String>,
        verifier: Option<SignatureVerifier>,
    ) -> Self {
        Self {
            service,
            agent,
            chat,
            channel_id: channel_id.into(),
            verifier,
        }
    }

    /// Wire the Slack client and verifier from whatever is configured.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        service: Arc<IncidentService>,
        agent: Arc<AgentLoop>,
        config: &SlackConfig,
    ) -> Result<Self, GatewayError> {
        let chat: Option<Arc<dyn ChatClient>> = if config.is_configured() {
            Some(Arc::new(SlackClient::new(config)?))
        } else {
            tracing::info!("chat bot token or channel missing; alert posting disabled");
            None
        };
        let verifier = config.can_verify().then(|| {
            SignatureVerifier::new(
                config.signing_secret.as_bytes(),
                Duration::from_secs(config.signature_tolerance_secs),
            )
        });
        Ok(Self::new(service, agent, chat, &config.channel_id, verifier))
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.chat.is_some()
    }

    fn chat(&self) -> Result<&dyn ChatClient, GatewayError> {
        self.chat
            .as_deref()
            .ok_or_else(|| GatewayError::NotConfigured("bot token or channel missing".into()))
    }

    /// Enqueue a pending approval for `incident` and post the interactive
    /// alert to the configured channel.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::NotConfigured`] when no chat client is wired.
    /// - [`GatewayError::Service`] if the approval cannot be stored.
    /// - [`GatewayError::ChatApi`] / [`GatewayError::Http`] if posting fails.
    #[tracing::instrument(skip(self, incident, alert), fields(incident_id = %incident.id))]
    pub async fn post_alert(
        &self,
        incident: &Incident,
        alert: &Value,
    ) -> Result<PostedAlert, GatewayError> {
        let chat = self.chat()?;
        let approval = self
            .service
            .enqueue_approval(NewApproval {
                incident_id: incident.id.clone(),
                alert: Some(alert.clone()),
                channel_id: Some(self.channel_id.clone()),
                thread_ts: None,
            })
            .await?;

        let message = ChatMessage {
            blocks: Some(alert_blocks(incident, alert, &approval.id)),
            ..ChatMessage::text(&self.channel_id, "Incident alert")
        };
        let posted = chat.post_message(&message).await?;
        let approval = self
            .service
            .set_approval_message(&approval.id, &posted.channel, &posted.ts)
            .await?;

        tracing::info!(approval_id = %approval.id, ts = %posted.ts, "alert posted");
        Ok(PostedAlert {
            approval,
            message: posted,
        })
    }

    /// Verify and act on an interactive callback.
    ///
    /// The signature is checked before anything in the body is read.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Auth`] for a missing secret, missing headers, a stale
    ///   timestamp, or a signature mismatch.
    /// - [`GatewayError::Payload`] for an undecodable body.
    /// - [`GatewayError::NotConfigured`] when no chat client is wired.
    /// - [`GatewayError::Service`] if the approval is unknown.
    #[tracing::instrument(skip_all)]
    pub async fn handle_action(
        &self,
        headers: ActionHeaders<'_>,
        body: &[u8],
    ) -> Result<ActionOutcome, GatewayError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or_else(|| GatewayError::Auth("signing secret is not configured".into()))?;
        verifier.verify(headers.timestamp, headers.signature, body)?;

        let chat = self.chat()?;
        let payload = parse_form_payload(body)?;
        let action = payload
            .first_action()
            .ok_or_else(|| GatewayError::Payload("interaction has no actions".into()))?;

        let channel = payload.channel_id().unwrap_or(&self.channel_id).to_string();
        let thread_ts = payload.thread_ts().map(str::to_string);
        let user_id = payload.user_id();
        let reply = |text: String| ChatMessage::text(&channel, text).in_thread(thread_ts.clone());
        tracing::info!(action_id = %action.action_id, user_id, "interactive action received");

        match action.action_id.as_str() {
            INITIATE_ACTION => {
                let value = ButtonValue::parse(action.value.as_deref())?;
                let approval = match self
                    .decide(value.approval_id.as_deref(), ApprovalState::Approved, user_id)
                    .await?
                {
                    Decision::Decided(approval) => approval,
                    Decision::AlreadyDecided(approval) => {
                        chat.post_message(&reply(already_decided_text(
                            value.alert_id(),
                            approval.state.as_str(),
                        )))
                        .await?;
                        return Ok(ActionOutcome::AlreadyDecided {
                            approval_id: approval.id,
                            state: approval.state,
                        });
                    }
                };

                let alert_id = value.alert_id().to_string();
                chat.post_message(&reply(acknowledgement_text(user_id, &alert_id)))
                    .await?;

                let alert = match (&value.alert, approval.as_ref()) {
                    (Value::Object(obj), Some(stored)) if obj.is_empty() => {
                        stored.alert.clone().unwrap_or_else(|| value.alert.clone())
                    }
                    _ => value.alert.clone(),
                };
                let incident_id = approval.as_ref().map(|a| a.incident_id.as_str());
                let report = self.agent.run(&alert, incident_id).await;

                let text = if report.summary.is_failed() {
                    failure_text(
                        &alert_id,
                        report.summary.reason.as_deref().unwrap_or("unknown"),
                    )
                } else {
                    format!("{} ✅", format_summary(&report.summary))
                };
                chat.post_message(&reply(text)).await?;

                Ok(ActionOutcome::Initiated {
                    approval_id: approval.map(|a| a.id),
                    report,
                })
            }
            IGNORE_ACTION => {
                let value = ButtonValue::parse(action.value.as_deref())?;
                match self
                    .decide(value.approval_id.as_deref(), ApprovalState::Rejected, user_id)
                    .await?
                {
                    Decision::Decided(approval) => {
                        chat.post_message(&reply(ignored_text(user_id, value.alert_id())))
                            .await?;
                        Ok(ActionOutcome::Ignored {
                            approval_id: approval.map(|a| a.id),
                        })
                    }
                    Decision::AlreadyDecided(approval) => {
                        chat.post_message(&reply(already_decided_text(
                            value.alert_id(),
                            approval.state.as_str(),
                        )))
                        .await?;
                        Ok(ActionOutcome::AlreadyDecided {
                            approval_id: approval.id,
                            state: approval.state,
                        })
                    }
                }
            }
            other => {
                tracing::warn!(action_id = other, "unknown interactive action");
                chat.post_message(&reply(unknown_action_text(other))).await?;
                Ok(ActionOutcome::UnknownAction {
                    action_id: other.to_string(),
                })
            }
        }
    }

    async fn decide(
        &self,
        approval_id: Option<&str>,
        decision: ApprovalState,
        user_id: &str,
    ) -> Result<Decision, GatewayError> {
        let Some(id) = approval_id else {
            return Ok(Decision::Decided(None));
        };
        match self.service.decide_approval(id, decision, Some(user_id)).await {
            Ok(approval) => Ok(Decision::Decided(Some(approval))),
            Err(err) if err.is_invalid_transition() => {
                let current = self.service.get_approval(id).await?;
                tracing::info!(approval_id = id, state = %current.state, "approval already decided");
                Ok(Decision::AlreadyDecided(current))
            }
            Err(err) => Err(err.into()),
        }
    }
}
