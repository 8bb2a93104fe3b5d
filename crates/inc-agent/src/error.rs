//! Agent error types.

use inc_core::errors::CoreError;
use inc_db::error::ServiceError;
use inc_evidence::FixtureError;
use inc_search::SearchError;
use thiserror::Error;

/// Errors from tool registration and invocation.
///
/// Invocation errors never leave the agent loop: they are rendered into the
/// tool output so the model can react.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// Arguments failed schema validation or typed deserialization.
    #[error("invalid arguments for '{tool}': {}", errors.join("; "))]
    ArgumentError { tool: String, errors: Vec<String> },

    /// The underlying incident service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The knowledge base search failed.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// A tool schema failed to compile at registration.
    #[error("schema for '{tool}' does not compile: {message}")]
    Schema { tool: String, message: String },

    /// Two tools were registered under one name.
    #[error("duplicate tool name '{0}'")]
    DuplicateTool(String),

    #[error("failed to serialize tool result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    /// Stable machine-readable code for the tool output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::ArgumentError { .. } => "argument_error",
            Self::Service(ServiceError::Core(core)) => match core {
                CoreError::NotFound { .. } => "not_found",
                CoreError::InvalidTransition { .. } => "invalid_transition",
                CoreError::Validation(_) => "validation_error",
                CoreError::Other(_) => "internal_error",
            },
            Self::Service(ServiceError::Fixture(FixtureError::Missing { .. })) => "missing_fixture",
            Self::Service(ServiceError::Fixture(FixtureError::InvalidType(_))) => {
                "validation_error"
            }
            Self::Search(SearchError::InvalidQuery(_)) => "invalid_query",
            Self::Service(_) | Self::Search(_) | Self::Serialize(_) => "internal_error",
            Self::Schema { .. } | Self::DuplicateTool(_) => "registry_error",
        }
    }

    /// The `{"ok": false, "error", "message"}` object sent back to the model.
    #[must_use]
    pub fn to_output(&self) -> serde_json::Value {
        serde_json::json!({
            "ok": false,
            "error": self.code(),
            "message": self.to_string(),
        })
    }
}

/// Errors from the language-model API client.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// No credential is configured.
    #[error("model API is not configured")]
    NotConfigured,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn output_carries_code_and_message() {
        let err = ToolError::ArgumentError {
            tool: "get_evidence".into(),
            errors: vec!["\"incident_id\" is a required property".into()],
        };
        let out = err.to_output();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "argument_error");
        assert!(out["message"].as_str().unwrap().contains("incident_id"));
    }

    #[test]
    fn service_errors_map_to_domain_codes() {
        let nf = ToolError::Service(ServiceError::Core(CoreError::not_found("incident", "INC-1")));
        assert_eq!(nf.code(), "not_found");
        let missing = ToolError::Service(ServiceError::Fixture(FixtureError::Missing {
            incident_type: "x".into(),
            file: "logs.json".into(),
        }));
        assert_eq!(missing.code(), "missing_fixture");
        let bad_type = ToolError::Service(ServiceError::Fixture(FixtureError::InvalidType(
            CoreError::Validation("incident type '../etc' contains invalid character '.'".into()),
        )));
        assert_eq!(bad_type.code(), "validation_error");
    }
}
