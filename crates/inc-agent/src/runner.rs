//! The bounded agent loop.
//!
//! ```text
//! AwaitingModel ──tool calls──▶ ExecutingTools ──▶ AwaitingModel ...
//!       │                             │
//!       ├──final text──▶ Done         └──over budget──▶ Aborted
//!       └──timeout / API error / bad output──▶ Aborted ──▶ FallingBack
//! ```
//!
//! Every run ends with a summary: the model's when it finishes cleanly, the
//! deterministic fixture summary otherwise.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use inc_config::IncidentConfig;
use inc_core::entities::Alert;
use inc_core::summary::IncidentSummary;
use inc_evidence::{SummaryContext, summarize_fixtures};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{ModelError, ToolError};
use crate::model::{ModelClient, ModelRequest, OpenAiClient};
use crate::prompt::SYSTEM_PROMPT;
use crate::tools::{ToolKind, ToolRegistry};

/// Budgets and fallback settings for one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub model: String,
    pub max_iterations: u32,
    pub max_tool_calls: u32,
    pub model_timeout: Duration,
    pub default_incident_type: String,
    pub next_update_minutes: u32,
}

impl AgentSettings {
    #[must_use]
    pub fn from_config(config: &IncidentConfig) -> Self {
        Self {
            model: config.openai.model.clone(),
            max_iterations: config.agent.max_iterations,
            max_tool_calls: config.agent.max_tool_calls,
            model_timeout: Duration::from_secs(config.openai.timeout_secs),
            default_incident_type: config.agent.default_incident_type.clone(),
            next_update_minutes: config.agent.next_update_minutes,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&IncidentConfig::default())
    }
}

/// Why a run stopped before the model produced a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum AbortReason {
    BudgetExhausted,
    Timeout,
    ExternalApi(String),
    MalformedOutput(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExhausted => f.write_str("budget exhausted"),
            Self::Timeout => f.write_str("model call timed out"),
            Self::ExternalApi(msg) => write!(f, "model API error: {msg}"),
            Self::MalformedOutput(msg) => write!(f, "malformed model output: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    /// The model returned a valid summary.
    Done,
    /// The loop stopped early; the summary came from fixtures.
    Aborted { reason: AbortReason },
    /// No model is configured; the summary came from fixtures.
    FixtureOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Model,
    Fixture,
}

/// One tool invocation as seen by the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub call_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReport {
    pub outcome: AgentOutcome,
    pub summary: IncidentSummary,
    pub summary_source: SummarySource,
    pub tool_calls: Vec<ToolCallRecord>,
    pub model_calls: u32,
}

/// A `function_call` output item.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub call_id: String,
    /// Parsed arguments, or why they could not be parsed.
    pub arguments: Result<Value, String>,
}

impl FunctionCall {
    fn from_item(item: &Value) -> Self {
        let text = |key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let arguments = match item.get("arguments") {
            None | Some(Value::Null) => Ok(json!({})),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(json!({})),
            Some(Value::String(raw)) => serde_json::from_str(raw)
                .map_err(|e| format!("arguments are not valid JSON: {e}")),
            Some(obj @ Value::Object(_)) => Ok(obj.clone()),
            Some(_) => Err("arguments must be a JSON object".to_string()),
        };
        Self {
            name: text("name"),
            call_id: text("call_id"),
            arguments,
        }
    }
}

enum ModelTurn {
    ToolCalls(Vec<FunctionCall>),
    Final(String),
}

enum AgentState {
    AwaitingModel,
    ExecutingTools(Vec<FunctionCall>),
    Done(IncidentSummary),
    Aborted(AbortReason),
    FallingBack(AbortReason),
}

/// Mutable record of one run.
struct RunState {
    history: Vec<Value>,
    tool_calls: Vec<ToolCallRecord>,
    model_calls: u32,
    incident_id: Option<String>,
}

/// Drives the model through tool calls to a structured summary.
pub struct AgentLoop {
    registry: Arc<ToolRegistry>,
    model: Option<Arc<dyn ModelClient>>,
    declarations: Vec<Value>,
    settings: AgentSettings,
}

impl AgentLoop {
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        model: Option<Arc<dyn ModelClient>>,
        settings: AgentSettings,
    ) -> Self {
        let declarations = registry.declarations();
        Self {
            registry,
            model,
            declarations,
            settings,
        }
    }

    /// Build a loop with the Responses API client when a key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Http`] if the HTTP client cannot be built.
    pub fn from_config(
        registry: Arc<ToolRegistry>,
        config: &IncidentConfig,
    ) -> Result<Self, ModelError> {
        let model: Option<Arc<dyn ModelClient>> = if config.openai.is_configured() {
            Some(Arc::new(OpenAiClient::new(&config.openai)?))
        } else {
            tracing::info!("no model API key configured; agent runs fixture-only");
            None
        };
        Ok(Self::new(registry, model, AgentSettings::from_config(config)))
    }

    #[must_use]
    pub const fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    #[must_use]
    pub const fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Run the loop for an alert, optionally tied to an existing incident.
    #[tracing::instrument(skip(self, alert))]
    pub async fn run(&self, alert: &Value, incident_id: Option<&str>) -> AgentReport {
        let parsed_alert = parse_alert(alert);
        let Some(model) = self.model.as_deref() else {
            let summary = self.fallback_summary(&parsed_alert, incident_id).await;
            return AgentReport {
                outcome: AgentOutcome::FixtureOnly,
                summary,
                summary_source: SummarySource::Fixture,
                tool_calls: Vec::new(),
                model_calls: 0,
            };
        };

        let user_content = incident_id.map_or_else(
            || alert.to_string(),
            |id| json!({"incident_id": id, "alert": alert}).to_string(),
        );
        let mut run = RunState {
            history: vec![
                json!({"type": "message", "role": "system", "content": SYSTEM_PROMPT}),
                json!({"type": "message", "role": "user", "content": user_content}),
            ],
            tool_calls: Vec::new(),
            model_calls: 0,
            incident_id: incident_id.map(str::to_string),
        };

        let mut state = AgentState::AwaitingModel;
        loop {
            state = match state {
                AgentState::AwaitingModel => {
                    if run.model_calls >= self.settings.max_iterations {
                        AgentState::Aborted(AbortReason::BudgetExhausted)
                    } else {
                        match self.call_model(model, &mut run).await {
                            Ok(ModelTurn::ToolCalls(calls)) => AgentState::ExecutingTools(calls),
                            Ok(ModelTurn::Final(text)) => match parse_summary(&text) {
                                Ok(summary) => AgentState::Done(summary),
                                Err(reason) => AgentState::Aborted(reason),
                            },
                            Err(reason) => AgentState::Aborted(reason),
                        }
                    }
                }
                AgentState::ExecutingTools(calls) => {
                    let budget = self.settings.max_tool_calls as usize;
                    let remaining = budget.saturating_sub(run.tool_calls.len());
                    let over_budget = calls.len() > remaining;
                    for call in calls.into_iter().take(remaining) {
                        self.execute_call(&mut run, call).await;
                    }
                    if over_budget {
                        AgentState::Aborted(AbortReason::BudgetExhausted)
                    } else {
                        AgentState::AwaitingModel
                    }
                }
                AgentState::Done(summary) => {
                    tracing::info!(
                        incident_id = %summary.incident_id,
                        model_calls = run.model_calls,
                        tool_calls = run.tool_calls.len(),
                        "agent run complete"
                    );
                    return AgentReport {
                        outcome: AgentOutcome::Done,
                        summary,
                        summary_source: SummarySource::Model,
                        tool_calls: run.tool_calls,
                        model_calls: run.model_calls,
                    };
                }
                AgentState::Aborted(reason) => {
                    tracing::warn!(%reason, model_calls = run.model_calls, "agent run aborted");
                    AgentState::FallingBack(reason)
                }
                AgentState::FallingBack(reason) => {
                    let summary = self
                        .fallback_summary(&parsed_alert, run.incident_id.as_deref())
                        .await;
                    return AgentReport {
                        outcome: AgentOutcome::Aborted { reason },
                        summary,
                        summary_source: SummarySource::Fixture,
                        tool_calls: run.tool_calls,
                        model_calls: run.model_calls,
                    };
                }
            };
        }
    }

    async fn call_model(
        &self,
        model: &dyn ModelClient,
        run: &mut RunState,
    ) -> Result<ModelTurn, AbortReason> {
        let request = ModelRequest {
            model: self.settings.model.clone(),
            input: run.history.clone(),
            tools: self.declarations.clone(),
        };
        run.model_calls += 1;
        let body = match tokio::time::timeout(self.settings.model_timeout, model.respond(&request))
            .await
        {
            Err(_) => return Err(AbortReason::Timeout),
            Ok(Err(err)) => return Err(AbortReason::ExternalApi(err.to_string())),
            Ok(Ok(body)) => body,
        };
        let (items, turn) = parse_turn(&body)?;
        run.history.extend(items);
        Ok(turn)
    }

    async fn execute_call(&self, run: &mut RunState, call: FunctionCall) {
        let result = match &call.arguments {
            Ok(args) => self.registry.invoke(&call.name, args).await,
            Err(msg) => Err(ToolError::ArgumentError {
                tool: call.name.clone(),
                errors: vec![msg.clone()],
            }),
        };

        let (output, error) = match result {
            Ok(value) => {
                if run.incident_id.is_none() {
                    run.incident_id = referenced_incident(&call, &value);
                }
                (value.to_string(), None)
            }
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "tool call failed");
                (err.to_output().to_string(), Some(err.code().to_string()))
            }
        };

        run.history.push(json!({
            "type": "function_call_output",
            "call_id": call.call_id,
            "output": output,
        }));
        run.tool_calls.push(ToolCallRecord {
            name: call.name,
            call_id: call.call_id,
            ok: error.is_none(),
            error,
        });
    }

    async fn fallback_summary(&self, alert: &Alert, incident_id: Option<&str>) -> IncidentSummary {
        let service = self.registry.service();
        let incident = match incident_id {
            Some(id) => match service.get_incident(id).await {
                Ok(incident) => Some(incident),
                Err(err) => {
                    tracing::warn!(incident_id = id, error = %err, "fallback incident lookup failed");
                    None
                }
            },
            None => None,
        };

        let incident_type = alert
            .incident_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| incident.as_ref().map(|i| i.incident_type.clone()))
            .unwrap_or_else(|| self.settings.default_incident_type.clone());

        let ctx = incident.as_ref().map_or_else(
            || SummaryContext::from_alert(alert, &incident_type),
            |i| SummaryContext::for_incident(i, Some(alert)),
        );
        summarize_fixtures(
            service.fixtures(),
            &incident_type,
            &ctx,
            self.settings.next_update_minutes,
        )
        .await
    }
}

fn parse_alert(alert: &Value) -> Alert {
    serde_json::from_value(alert.clone()).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "alert does not match the known shape");
        Alert::default()
    })
}

/// Incident id a successful call created or touched.
fn referenced_incident(call: &FunctionCall, result: &Value) -> Option<String> {
    let id = match ToolKind::from_name(&call.name)? {
        ToolKind::CreateIncident | ToolKind::AssignIncident => result.get("id"),
        ToolKind::GetEvidence | ToolKind::AddNote => result.get("incident_id"),
        ToolKind::SearchKb => None,
    };
    id.and_then(Value::as_str).map(str::to_string)
}

/// Split a response into the items to keep in history and the next step.
fn parse_turn(body: &Value) -> Result<(Vec<Value>, ModelTurn), AbortReason> {
    let Some(output) = body.get("output").and_then(Value::as_array) else {
        return Err(AbortReason::MalformedOutput(
            "response has no output array".to_string(),
        ));
    };

    let calls: Vec<FunctionCall> = output
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("function_call"))
        .map(FunctionCall::from_item)
        .collect();
    let turn = if calls.is_empty() {
        ModelTurn::Final(extract_text(output, body.get("output_text")))
    } else {
        ModelTurn::ToolCalls(calls)
    };
    Ok((output.clone(), turn))
}

/// Join the text of every message item, falling back to `output_text`.
fn extract_text(output: &[Value], output_text: Option<&Value>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for item in output {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        match item.get("content") {
            Some(Value::String(text)) => parts.push(text),
            Some(Value::Array(content)) => {
                for part in content {
                    let kind = part.get("type").and_then(Value::as_str);
                    if matches!(kind, Some("output_text" | "text")) {
                        if let Some(text) = part.get("text").and_then(Value::as_str) {
                            parts.push(text);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    let joined = parts.join("\n");
    if joined.trim().is_empty() {
        output_text
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    } else {
        joined
    }
}

fn parse_summary(text: &str) -> Result<IncidentSummary, AbortReason> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(AbortReason::MalformedOutput(
            "model returned no text".to_string(),
        ));
    }
    serde_json::from_str(body)
        .map_err(|e| AbortReason::MalformedOutput(format!("summary is not valid JSON: {e}")))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("{\"a\":1}", "{\"a\":1}")]
    #[case("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case("```\n{\"a\":1}\n```\n", "{\"a\":1}")]
    #[case("  {\"a\":1}  ", "{\"a\":1}")]
    fn code_fences_stripped(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_code_fences(raw), expected);
    }

    #[test]
    fn text_joined_from_message_parts() {
        let output = vec![
            json!({"type": "reasoning", "summary": []}),
            json!({"type": "message", "content": [
                {"type": "output_text", "text": "{\"incident_id\":"},
                {"type": "refusal", "refusal": "no"},
                {"type": "text", "text": "\"INC-1\"}"}
            ]}),
        ];
        assert_eq!(extract_text(&output, None), "{\"incident_id\":\n\"INC-1\"}");
    }

    #[test]
    fn text_falls_back_to_output_text() {
        let top = json!("final answer");
        assert_eq!(extract_text(&[], Some(&top)), "final answer");
    }

    #[test]
    fn function_call_arguments_accept_string_or_object() {
        let from_string = FunctionCall::from_item(&json!({
            "type": "function_call", "name": "get_evidence", "call_id": "c1",
            "arguments": "{\"incident_id\":\"INC-1\"}"
        }));
        assert_eq!(from_string.arguments, Ok(json!({"incident_id": "INC-1"})));

        let from_object = FunctionCall::from_item(&json!({
            "type": "function_call", "name": "get_evidence", "call_id": "c2",
            "arguments": {"incident_id": "INC-2"}
        }));
        assert_eq!(from_object.arguments, Ok(json!({"incident_id": "INC-2"})));

        let broken = FunctionCall::from_item(&json!({
            "type": "function_call", "name": "get_evidence", "call_id": "c3",
            "arguments": "{not json"
        }));
        assert!(broken.arguments.is_err());
    }

    #[test]
    fn output_must_be_an_array() {
        let err = parse_turn(&json!({"output": "nope"})).err().unwrap();
        assert!(matches!(err, AbortReason::MalformedOutput(_)));
    }

    #[test]
    fn empty_text_is_malformed() {
        assert!(matches!(
            parse_summary("  "),
            Err(AbortReason::MalformedOutput(_))
        ));
    }

    #[test]
    fn outcome_serialization() {
        let aborted = AgentOutcome::Aborted {
            reason: AbortReason::ExternalApi("502".into()),
        };
        assert_eq!(
            serde_json::to_value(&aborted).unwrap(),
            json!({"status": "aborted", "reason": {"code": "external_api", "detail": "502"}})
        );
        assert_eq!(
            serde_json::to_value(AgentOutcome::FixtureOnly).unwrap(),
            json!({"status": "fixture_only"})
        );
    }
}
