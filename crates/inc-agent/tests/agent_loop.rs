//! Agent loop behaviour against scripted models.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inc_agent::{
    AbortReason, AgentLoop, AgentOutcome, AgentSettings, ModelClient, ModelError, ModelRequest,
    SummarySource, ToolRegistry,
};
use inc_core::enums::SummaryStatus;
use inc_db::test_support::test_service;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

type Step = Box<dyn Fn(&ModelRequest) -> Result<Value, ModelError> + Send + Sync>;

fn step(f: impl Fn(&ModelRequest) -> Result<Value, ModelError> + Send + Sync + 'static) -> Step {
    Box::new(f)
}

/// Replays one step per model call and records every request.
struct ScriptedModel {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn respond(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("model called more often than scripted");
        next(request)
    }
}

/// Never answers within the loop's timeout.
struct SlowModel;

#[async_trait]
impl ModelClient for SlowModel {
    async fn respond(&self, _request: &ModelRequest) -> Result<Value, ModelError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(json!({"output": []}))
    }
}

fn call(name: &str, call_id: &str, args: &Value) -> Value {
    json!({
        "type": "function_call",
        "name": name,
        "call_id": call_id,
        "arguments": args.to_string(),
    })
}

fn tools_turn(calls: Vec<Value>) -> Value {
    json!({ "output": calls })
}

fn final_turn(text: &str) -> Value {
    json!({
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": text}]
        }]
    })
}

/// The JSON output of the most recent tool call in the request history.
fn last_tool_output(request: &ModelRequest) -> Value {
    let item = request
        .input
        .iter()
        .rev()
        .find(|i| i["type"] == "function_call_output")
        .expect("no tool output in history");
    serde_json::from_str(item["output"].as_str().unwrap()).unwrap()
}

fn payments_alert() -> Value {
    json!({
        "alert_id": "A-100",
        "incident_type": "payments_failing",
        "service": "checkout-api",
        "signal": "error_rate_spike",
        "short_summary": "Checkout 5xx above 15%"
    })
}

fn settings() -> AgentSettings {
    AgentSettings {
        model_timeout: Duration::from_secs(5),
        ..AgentSettings::default()
    }
}

async fn agent(model: Option<Arc<dyn ModelClient>>, settings: AgentSettings) -> AgentLoop {
    let service = Arc::new(test_service().await.unwrap());
    let registry = Arc::new(ToolRegistry::new(service).unwrap());
    AgentLoop::new(registry, model, settings)
}

#[tokio::test]
async fn tool_calls_then_summary_completes() {
    let model = ScriptedModel::new(vec![
        step(|_| {
            Ok(tools_turn(vec![call(
                "create_incident",
                "c1",
                &json!({"incident_type": "payments_failing", "service": "checkout-api"}),
            )]))
        }),
        step(|req| {
            let incident = last_tool_output(req);
            Ok(tools_turn(vec![call(
                "get_evidence",
                "c2",
                &json!({"incident_id": incident["id"]}),
            )]))
        }),
        step(|req| {
            let bundle = last_tool_output(req);
            let summary = json!({
                "incident_id": bundle["incident_id"],
                "status": "in_progress",
                "severity": "SEV1",
                "service": "checkout-api",
                "summary": "Gateway timeouts after deploy",
                "next_update_minutes": 10
            });
            Ok(final_turn(&format!("```json\n{summary}\n```")))
        }),
    ]);
    let agent = agent(Some(model.clone()), settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(report.outcome, AgentOutcome::Done);
    assert_eq!(report.summary_source, SummarySource::Model);
    assert_eq!(report.model_calls, 3);
    assert_eq!(report.summary.next_update_minutes, 10);
    assert!(report.summary.incident_id.starts_with("INC-"));
    let names: Vec<_> = report.tool_calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["create_incident", "get_evidence"]);
    assert!(report.tool_calls.iter().all(|c| c.ok));

    let requests = model.requests();
    assert_eq!(requests[0].input.len(), 2);
    assert_eq!(requests[0].input[0]["role"], "system");
    assert_eq!(requests[0].tools.len(), 5);
    // system + user + (call + output) per tool round
    assert_eq!(requests[2].input.len(), 6);
    assert_eq!(requests[2].input[5]["call_id"], "c2");
}

#[tokio::test]
async fn tool_errors_are_returned_to_the_model() {
    let model = ScriptedModel::new(vec![
        step(|_| {
            Ok(tools_turn(vec![
                call("drop_tables", "c1", &json!({})),
                call("assign_incident", "c2", &json!({"incident_id": "INC-1"})),
            ]))
        }),
        step(|req| {
            let outputs: Vec<Value> = req
                .input
                .iter()
                .filter(|i| i["type"] == "function_call_output")
                .map(|i| serde_json::from_str(i["output"].as_str().unwrap()).unwrap())
                .collect();
            assert_eq!(outputs[0]["ok"], false);
            assert_eq!(outputs[0]["error"], "unknown_tool");
            assert_eq!(outputs[1]["error"], "argument_error");
            Ok(final_turn(
                r#"{"incident_id":"INC-A-100","status":"failed","severity":"SEV1","service":"checkout-api","summary":"tools unavailable"}"#,
            ))
        }),
    ]);
    let agent = agent(Some(model), settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(report.outcome, AgentOutcome::Done);
    assert_eq!(report.summary.status, SummaryStatus::Failed);
    assert_eq!(report.tool_calls.len(), 2);
    assert!(!report.tool_calls[0].ok);
    assert_eq!(report.tool_calls[0].error.as_deref(), Some("unknown_tool"));
}

#[tokio::test]
async fn tool_budget_stops_before_overrun() {
    let model = ScriptedModel::new(vec![step(|_| {
        Ok(tools_turn(vec![
            call("search_kb", "c1", &json!({"query": "gateway timeout"})),
            call("search_kb", "c2", &json!({"query": "severity rubric"})),
            call("search_kb", "c3", &json!({"query": "status update"})),
        ]))
    })]);
    let settings = AgentSettings {
        max_tool_calls: 2,
        ..settings()
    };
    let agent = agent(Some(model), settings).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(
        report.outcome,
        AgentOutcome::Aborted {
            reason: AbortReason::BudgetExhausted
        }
    );
    assert_eq!(report.tool_calls.len(), 2);
    assert_eq!(report.summary_source, SummarySource::Fixture);
    assert_eq!(report.summary.status, SummaryStatus::InProgress);
    assert_eq!(report.summary.service, "checkout-api");
}

#[tokio::test]
async fn iteration_budget_bounds_model_calls() {
    let search = || {
        step(|_| {
            Ok(tools_turn(vec![call(
                "search_kb",
                "c",
                &json!({"query": "payments"}),
            )]))
        })
    };
    let model = ScriptedModel::new(vec![search(), search()]);
    let settings = AgentSettings {
        max_iterations: 2,
        ..settings()
    };
    let agent = agent(Some(model), settings).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(report.model_calls, 2);
    assert_eq!(
        report.outcome,
        AgentOutcome::Aborted {
            reason: AbortReason::BudgetExhausted
        }
    );
}

#[tokio::test]
async fn slow_model_times_out_into_fallback() {
    let settings = AgentSettings {
        model_timeout: Duration::from_millis(50),
        ..settings()
    };
    let agent = agent(Some(Arc::new(SlowModel)), settings).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(
        report.outcome,
        AgentOutcome::Aborted {
            reason: AbortReason::Timeout
        }
    );
    assert_eq!(report.model_calls, 1);
    assert_eq!(report.summary.incident_id, "INC-A-100");
    assert_eq!(report.summary_source, SummarySource::Fixture);
}

#[tokio::test]
async fn api_error_falls_back() {
    let model = ScriptedModel::new(vec![step(|_| {
        Err(ModelError::Api {
            status: 503,
            message: "overloaded".into(),
        })
    })]);
    let agent = agent(Some(model), settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    match report.outcome {
        AgentOutcome::Aborted {
            reason: AbortReason::ExternalApi(msg),
        } => assert!(msg.contains("503"), "{msg}"),
        other => panic!("expected external API abort, got {other:?}"),
    }
    assert!(!report.summary.recommended_actions.is_empty());
}

#[tokio::test]
async fn non_json_summary_is_malformed() {
    let model = ScriptedModel::new(vec![step(|_| {
        Ok(final_turn("The incident looks bad, paging everyone."))
    })]);
    let agent = agent(Some(model), settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    assert!(matches!(
        report.outcome,
        AgentOutcome::Aborted {
            reason: AbortReason::MalformedOutput(_)
        }
    ));
    assert_eq!(report.summary_source, SummarySource::Fixture);
}

#[tokio::test]
async fn missing_output_array_is_malformed() {
    let model = ScriptedModel::new(vec![step(|_| Ok(json!({"id": "resp_1"})))]);
    let agent = agent(Some(model), settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    assert!(matches!(
        report.outcome,
        AgentOutcome::Aborted {
            reason: AbortReason::MalformedOutput(_)
        }
    ));
}

#[tokio::test]
async fn fallback_uses_incident_created_during_run() {
    let model = ScriptedModel::new(vec![
        step(|_| {
            Ok(tools_turn(vec![call(
                "create_incident",
                "c1",
                &json!({"incident_type": "login_outage", "service": "auth-service"}),
            )]))
        }),
        step(|_| Ok(final_turn("not json"))),
    ]);
    let agent = agent(Some(model), settings()).await;
    let alert = json!({"alert_id": "A-7", "signal": "login_error_spike"});

    let report = agent.run(&alert, None).await;

    assert_eq!(report.summary.service, "auth-service");
    assert!(report.summary.incident_id.starts_with("INC-"));
    assert_ne!(report.summary.incident_id, "INC-A-7");
    assert_eq!(
        report.summary.evidence.runbook_title.as_deref(),
        Some("Login outage / authentication failures")
    );
}

#[tokio::test]
async fn without_model_runs_fixture_only() {
    let agent = agent(None, settings()).await;

    let report = agent.run(&payments_alert(), None).await;

    assert_eq!(report.outcome, AgentOutcome::FixtureOnly);
    assert_eq!(report.model_calls, 0);
    assert!(report.tool_calls.is_empty());
    assert_eq!(report.summary.incident_id, "INC-A-100");
    assert_eq!(report.summary.suggested_mitigations.len(), 3);
}

#[tokio::test]
async fn unknown_type_without_model_reports_failure() {
    let agent = agent(None, settings()).await;

    let report = agent
        .run(&json!({"alert_id": "A-9", "incident_type": "disk_full"}), None)
        .await;

    assert_eq!(report.summary.status, SummaryStatus::Failed);
    assert_eq!(
        report.summary.reason.as_deref(),
        Some("Unknown incident_type 'disk_full' (no fixtures found).")
    );
}
