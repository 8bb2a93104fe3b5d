//! Knowledge base search entry point.

use inc_core::entities::KbHit;
use inc_db::service::IncidentService;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::query::build_match_query;

pub const DEFAULT_TOP_K: u32 = 3;
pub const MAX_TOP_K: u32 = 10;

/// A search request as received over HTTP or from the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct KbQuery {
    /// Free-text query.
    pub q: String,
    /// Number of results, clamped to `1..=10`. Defaults to 3.
    #[serde(default)]
    pub k: Option<u32>,
    /// Incident type boost, e.g. `payments_failing`.
    #[serde(default)]
    pub incident_type: Option<String>,
    /// Service boost, e.g. `checkout-api`.
    #[serde(default)]
    pub service: Option<String>,
}

impl KbQuery {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn top_k(&self) -> u32 {
        self.k.unwrap_or(DEFAULT_TOP_K).clamp(1, MAX_TOP_K)
    }
}

/// Ranked results plus the expression actually sent to FTS5.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KbSearchResponse {
    pub query: String,
    pub matched_query: String,
    pub top_k: u32,
    pub results: Vec<KbHit>,
}

/// Search the knowledge base, best match first.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] if the query is empty or whitespace.
/// Returns [`SearchError::Database`] if the FTS5 query fails.
pub async fn kb_search(
    service: &IncidentService,
    query: &KbQuery,
) -> Result<KbSearchResponse, SearchError> {
    if query.q.trim().is_empty() {
        return Err(SearchError::InvalidQuery(
            "search query cannot be empty".to_string(),
        ));
    }

    let top_k = query.top_k();
    let Some(matched_query) = build_match_query(
        &query.q,
        query.incident_type.as_deref(),
        query.service.as_deref(),
    ) else {
        tracing::debug!(q = %query.q, "query has no word tokens");
        return Ok(KbSearchResponse {
            query: query.q.clone(),
            matched_query: String::new(),
            top_k,
            results: Vec::new(),
        });
    };

    let results = service.search_kb_chunks(&matched_query, top_k).await?;
    tracing::debug!(q = %query.q, %matched_query, hits = results.len(), "kb search");

    Ok(KbSearchResponse {
        query: query.q.clone(),
        matched_query,
        top_k,
        results,
    })
}
