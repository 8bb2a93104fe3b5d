//! # inc-agent
//!
//! The model-driven half of the incident service:
//! - [`tools`]: the closed set of tools the model may call, with
//!   schema-validated arguments
//! - [`model`]: the [`ModelClient`] seam and the Responses API client
//! - [`runner`]: the bounded [`AgentLoop`] that falls back to the fixture
//!   summary whenever the model path fails

pub mod error;
pub mod model;
pub mod prompt;
pub mod runner;
pub mod tools;

pub use error::{ModelError, ToolError};
pub use model::{ModelClient, ModelRequest, OpenAiClient};
pub use runner::{
    AbortReason, AgentLoop, AgentOutcome, AgentReport, AgentSettings, SummarySource,
    ToolCallRecord,
};
pub use tools::{ToolKind, ToolRegistry};
