//! Tool registry exposed to the model.
//!
//! The set of tools is closed: [`ToolKind`] names every tool, each with a
//! typed argument struct whose JSON Schema is generated by `schemars` and
//! compiled by `jsonschema` when the registry is built. Arguments arriving
//! from the model are validated against the compiled schema before they are
//! deserialized and dispatched to the incident service.

use std::collections::HashSet;
use std::sync::Arc;

use inc_core::entities::{NewIncident, NewNote};
use inc_db::service::IncidentService;
use inc_search::{KbQuery, kb_search};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;

/// Author recorded on notes the agent writes without naming one.
pub const AGENT_AUTHOR: &str = "orchestrate";

/// Every tool the agent may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CreateIncident,
    AssignIncident,
    GetEvidence,
    AddNote,
    SearchKb,
}

impl ToolKind {
    pub const ALL: [Self; 5] = [
        Self::CreateIncident,
        Self::AssignIncident,
        Self::GetEvidence,
        Self::AddNote,
        Self::SearchKb,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CreateIncident => "create_incident",
            Self::AssignIncident => "assign_incident",
            Self::GetEvidence => "get_evidence",
            Self::AddNote => "add_note",
            Self::SearchKb => "search_kb",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CreateIncident => {
                "Create an incident from an alert. Returns the stored incident with its id, severity and owning teams."
            }
            Self::AssignIncident => "Assign an open or assigned incident to a responder.",
            Self::GetEvidence => {
                "Fetch logs, metrics, recent changes and the runbook for an incident."
            }
            Self::AddNote => "Append a note (comment, comms update, decision) to an incident.",
            Self::SearchKb => {
                "Search the knowledge base (runbooks, severity policy, comms templates)."
            }
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// JSON Schema of the tool's argument object.
    #[must_use]
    pub fn parameters_schema(self) -> Value {
        let schema = match self {
            Self::CreateIncident => schema_for!(CreateIncidentArgs),
            Self::AssignIncident => schema_for!(AssignIncidentArgs),
            Self::GetEvidence => schema_for!(GetEvidenceArgs),
            Self::AddNote => schema_for!(AddNoteArgs),
            Self::SearchKb => schema_for!(SearchKbArgs),
        };
        let mut value = schema.to_value();
        if let Some(obj) = value.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        value
    }
}

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CreateIncidentArgs {
    /// Incident type tag from the alert, e.g. `payments_failing`.
    pub incident_type: String,
    /// Affected service, e.g. `checkout-api`.
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl From<CreateIncidentArgs> for NewIncident {
    fn from(args: CreateIncidentArgs) -> Self {
        Self {
            incident_type: args.incident_type,
            service: args.service,
            signal: args.signal,
            impact: args.impact,
            region: args.region,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssignIncidentArgs {
    pub incident_id: String,
    /// Responder handle or team name.
    pub assignee: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GetEvidenceArgs {
    pub incident_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AddNoteArgs {
    pub incident_id: String,
    pub body: String,
    #[serde(default = "default_author")]
    pub author: String,
    /// Note category, e.g. `comment`, `comms_update`, `decision`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Structured data attached to the note.
    #[serde(default)]
    pub payload: Option<Value>,
}

fn default_author() -> String {
    AGENT_AUTHOR.to_string()
}

impl From<AddNoteArgs> for NewNote {
    fn from(args: AddNoteArgs) -> Self {
        let mut note = Self::comment(args.author, args.body);
        if let Some(kind) = args.kind {
            note.kind = kind;
        }
        note.title = args.title;
        note.payload = args.payload;
        note
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SearchKbArgs {
    pub query: String,
    /// Number of results, 1 to 10.
    #[serde(default)]
    pub k: Option<u32>,
    #[serde(default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

impl From<SearchKbArgs> for KbQuery {
    fn from(args: SearchKbArgs) -> Self {
        Self {
            q: args.query,
            k: args.k,
            incident_type: args.incident_type,
            service: args.service,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct RegisteredTool {
    kind: ToolKind,
    parameters: Value,
    validator: jsonschema::Validator,
}

/// Compiled tool set bound to an incident service.
pub struct ToolRegistry {
    service: Arc<IncidentService>,
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Register every [`ToolKind`] and compile its argument schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Schema`] if a schema does not compile, or
    /// [`ToolError::DuplicateTool`] if two tools share a name.
    pub fn new(service: Arc<IncidentService>) -> Result<Self, ToolError> {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(ToolKind::ALL.len());
        for kind in ToolKind::ALL {
            if !seen.insert(kind.name()) {
                return Err(ToolError::DuplicateTool(kind.name().to_string()));
            }
            let parameters = kind.parameters_schema();
            let validator =
                jsonschema::validator_for(&parameters).map_err(|e| ToolError::Schema {
                    tool: kind.name().to_string(),
                    message: e.to_string(),
                })?;
            tools.push(RegisteredTool {
                kind,
                parameters,
                validator,
            });
        }
        Ok(Self { service, tools })
    }

    #[must_use]
    pub const fn service(&self) -> &Arc<IncidentService> {
        &self.service
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.kind.name()).collect()
    }

    /// Function declarations in the Responses API format.
    #[must_use]
    pub fn declarations(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "name": tool.kind.name(),
                    "description": tool.kind.description(),
                    "parameters": tool.parameters,
                })
            })
            .collect()
    }

    /// Schema violations of `args` for the named tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if no tool has that name.
    pub fn validate(&self, name: &str, args: &Value) -> Result<Vec<String>, ToolError> {
        let tool = self.lookup(name)?;
        Ok(tool
            .validator
            .iter_errors(args)
            .map(|e| format!("{e}"))
            .collect())
    }

    /// Validate and run a tool call, returning its JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`], [`ToolError::ArgumentError`], or the
    /// service/search error raised by the underlying operation.
    #[tracing::instrument(skip(self, args))]
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        let errors = self.validate(name, args)?;
        if !errors.is_empty() {
            return Err(ToolError::ArgumentError {
                tool: name.to_string(),
                errors,
            });
        }
        let kind = self.lookup(name)?.kind;
        let service = self.service.as_ref();

        let result = match kind {
            ToolKind::CreateIncident => {
                let args: CreateIncidentArgs = parse_args(name, args)?;
                serde_json::to_value(service.create_incident(args.into()).await?)?
            }
            ToolKind::AssignIncident => {
                let args: AssignIncidentArgs = parse_args(name, args)?;
                serde_json::to_value(
                    service
                        .assign_incident(&args.incident_id, &args.assignee)
                        .await?,
                )?
            }
            ToolKind::GetEvidence => {
                let args: GetEvidenceArgs = parse_args(name, args)?;
                serde_json::to_value(service.get_evidence(&args.incident_id).await?)?
            }
            ToolKind::AddNote => {
                let args: AddNoteArgs = parse_args(name, args)?;
                let incident_id = args.incident_id.clone();
                serde_json::to_value(service.add_note(&incident_id, args.into()).await?)?
            }
            ToolKind::SearchKb => {
                let args: SearchKbArgs = parse_args(name, args)?;
                serde_json::to_value(kb_search(service, &args.into()).await?)?
            }
        };
        tracing::debug!(tool = name, "tool call succeeded");
        Ok(result)
    }

    fn lookup(&self, name: &str) -> Result<&RegisteredTool, ToolError> {
        self.tools
            .iter()
            .find(|t| t.kind.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::ArgumentError {
        tool: tool.to_string(),
        errors: vec![e.to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use inc_db::test_support::test_service;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn registry() -> ToolRegistry {
        let service = test_service().await.unwrap();
        ToolRegistry::new(Arc::new(service)).unwrap()
    }

    #[test]
    fn names_roundtrip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("drop_tables"), None);
    }

    #[test]
    fn schemas_are_bare_objects() {
        for kind in ToolKind::ALL {
            let schema = kind.parameters_schema();
            assert_eq!(schema["type"], "object", "{}", kind.name());
            assert!(schema.get("$schema").is_none());
            assert!(schema.get("title").is_none());
        }
        let required = ToolKind::AssignIncident.parameters_schema()["required"].clone();
        assert_eq!(required, json!(["incident_id", "assignee"]));
    }

    #[tokio::test]
    async fn declarations_use_flat_function_format() {
        let registry = registry().await;
        let decls = registry.declarations();
        assert_eq!(decls.len(), 5);
        assert_eq!(decls[0]["type"], "function");
        assert_eq!(decls[0]["name"], "create_incident");
        assert!(decls[0]["parameters"]["properties"]["incident_type"].is_object());
    }

    #[tokio::test]
    async fn unknown_tool_rejected() {
        let registry = registry().await;
        let err = registry.invoke("drop_tables", &json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "drop_tables"));
    }

    #[tokio::test]
    async fn missing_required_argument_rejected_before_dispatch() {
        let registry = registry().await;
        let err = registry
            .invoke("assign_incident", &json!({"incident_id": "INC-1"}))
            .await
            .unwrap_err();
        match err {
            ToolError::ArgumentError { tool, errors } => {
                assert_eq!(tool, "assign_incident");
                assert!(errors.iter().any(|e| e.contains("assignee")), "{errors:?}");
            }
            other => panic!("expected ArgumentError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_type_rejected() {
        let registry = registry().await;
        let err = registry
            .invoke("search_kb", &json!({"query": "sev policy", "k": "three"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "argument_error");
    }

    #[tokio::test]
    async fn create_then_fetch_evidence() {
        let registry = registry().await;
        let incident = registry
            .invoke(
                "create_incident",
                &json!({"incident_type": "payments_failing", "service": "checkout-api"}),
            )
            .await
            .unwrap();
        assert_eq!(incident["severity"], "SEV1");
        let id = incident["id"].as_str().unwrap();

        let bundle = registry
            .invoke("get_evidence", &json!({"incident_id": id}))
            .await
            .unwrap();
        assert_eq!(bundle["incident_type"], "payments_failing");
        assert!(bundle["evidence"]["runbook"]["steps"].is_array());
    }

    #[tokio::test]
    async fn add_note_defaults_author() {
        let registry = registry().await;
        let incident = registry
            .invoke("create_incident", &json!({"incident_type": "login_outage"}))
            .await
            .unwrap();
        let note = registry
            .invoke(
                "add_note",
                &json!({"incident_id": incident["id"], "body": "Paged identity on-call"}),
            )
            .await
            .unwrap();
        assert_eq!(note["author"], AGENT_AUTHOR);
        assert_eq!(note["kind"], "comment");
    }

    #[tokio::test]
    async fn service_errors_surface_with_domain_code() {
        let registry = registry().await;
        let err = registry
            .invoke("get_evidence", &json!({"incident_id": "INC-MISSING"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn search_kb_finds_runbook() {
        let registry = registry().await;
        let result = registry
            .invoke(
                "search_kb",
                &json!({"query": "gateway timeout", "incident_type": "payments_failing"}),
            )
            .await
            .unwrap();
        let hits = result["results"].as_array().unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0]["chunk_id"], "rb-payments-001");
    }
}
