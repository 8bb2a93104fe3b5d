use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An append-only note attached to exactly one incident.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub incident_id: String,
    pub author: String,
    pub body: String,
    /// Free-form category, e.g. `comment`, `comms_update`, `postmortem`.
    pub kind: String,
    pub title: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a note.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewNote {
    pub author: String,
    pub body: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

fn default_kind() -> String {
    "comment".to_string()
}

impl NewNote {
    pub fn comment(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            kind: default_kind(),
            title: None,
            payload: None,
        }
    }
}
