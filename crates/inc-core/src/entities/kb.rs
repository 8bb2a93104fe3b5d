use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A knowledge-base text fragment stored in the FTS5 index.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct KbChunk {
    pub chunk_id: String,
    pub title: String,
    /// Space-separated tags, searched alongside title and content.
    pub tags: String,
    pub content: String,
    /// Source document reference, e.g. `runbooks/payments_failing.md#gateway-timeouts`.
    pub source: String,
}

/// A ranked KB search hit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KbHit {
    pub chunk_id: String,
    pub title: String,
    pub source: String,
    pub tags: String,
    pub snippet: String,
    /// Relevance score (negated bm25; higher = more relevant).
    pub score: f64,
}
