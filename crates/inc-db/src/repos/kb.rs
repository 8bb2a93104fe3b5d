//! Knowledge base storage over the `kb_chunks` FTS5 table.
//!
//! Query construction (tokenizing, severity rewrite, boosts) lives in
//! `inc-search`; this module only stores chunks and runs a prepared
//! `MATCH` expression.

use inc_core::entities::{KbChunk, KbHit};

use crate::error::{DatabaseError, ServiceError};
use crate::service::IncidentService;

/// Chunks inserted on startup if absent.
#[must_use]
pub fn seed_chunks() -> Vec<KbChunk> {
    vec![
        KbChunk {
            chunk_id: "rb-payments-001".into(),
            title: "Runbook: Payments failing - gateway timeouts".into(),
            tags: "payments_failing checkout_api gateway timeout circuit_breaker".into(),
            content: "Checks: confirm health endpoint unhealthy; look for upstream timeout errors; \
                      inspect upstream_timeout_rate and error_rate spikes; review recent deploys, flags, config.\n\
                      Mitigations: revert gateway timeout to prior value; disable enable_new_gateway flag; rollback recent deploy.\n\
                      Post-mitigation: confirm circuit breaker closes and error_rate drops."
                .into(),
            source: "runbooks/payments_failing.md#gateway-timeouts".into(),
        },
        KbChunk {
            chunk_id: "pol-sev-001".into(),
            title: "Policy: Severity rubric".into(),
            tags: "sev sev1 sev2 sev3 policy".into(),
            content: "SEV1: payments failing or login outage with clear customer impact.\n\
                      SEV2: partial degradation (elevated latency or partial failures).\n\
                      SEV3: minor issue with limited/no customer impact."
                .into(),
            source: "policies/severity.md".into(),
        },
        KbChunk {
            chunk_id: "tpl-comms-001".into(),
            title: "Comms: Status update guidance".into(),
            tags: "comms status_update template guidance".into(),
            content: "Initial update should avoid absolute root cause. Use: 'under investigation', 'appears related to'. \
                      Include: what's happening, customer impact, what we're doing, next update ETA.\n\
                      After mitigation: what changed, current status, remaining risk, next steps."
                .into(),
            source: "templates/comms.md#status-updates".into(),
        },
    ]
}

fn row_to_hit(row: &libsql::Row) -> Result<KbHit, DatabaseError> {
    Ok(KbHit {
        chunk_id: row.get(0)?,
        title: row.get(1)?,
        source: row.get(2)?,
        tags: row.get(3)?,
        snippet: row.get(4)?,
        score: -row.get::<f64>(5)?,
    })
}

impl IncidentService {
    /// Insert the seed chunks that are not present yet. Returns how many
    /// were inserted; safe to run on every startup.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a lookup or insert fails.
    pub async fn seed_kb(&self) -> Result<usize, DatabaseError> {
        let mut inserted = 0;
        for chunk in seed_chunks() {
            if !self.kb_chunk_exists(&chunk.chunk_id).await? {
                self.insert_kb_chunk(&chunk).await?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Insert or replace a chunk by `chunk_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete or insert fails.
    pub async fn upsert_kb_chunk(&self, chunk: &KbChunk) -> Result<(), ServiceError> {
        self.db()
            .conn()
            .execute(
                "DELETE FROM kb_chunks WHERE chunk_id = ?1",
                [chunk.chunk_id.as_str()],
            )
            .await?;
        self.insert_kb_chunk(chunk).await?;
        tracing::debug!(chunk_id = %chunk.chunk_id, "kb chunk upserted");
        Ok(())
    }

    /// Number of stored chunks.
    pub async fn kb_chunk_count(&self) -> Result<u64, ServiceError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT count(*) FROM kb_chunks", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run an FTS5 `MATCH` expression, best match first.
    ///
    /// Ties in relevance keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the expression is rejected by FTS5.
    pub async fn search_kb_chunks(
        &self,
        match_expr: &str,
        limit: u32,
    ) -> Result<Vec<KbHit>, ServiceError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT chunk_id, title, source, tags, content, bm25(kb_chunks)
                 FROM kb_chunks WHERE kb_chunks MATCH ?1
                 ORDER BY bm25(kb_chunks), rowid LIMIT ?2",
                libsql::params![match_expr, i64::from(limit)],
            )
            .await?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await? {
            hits.push(row_to_hit(&row)?);
        }
        Ok(hits)
    }

    async fn kb_chunk_exists(&self, chunk_id: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT 1 FROM kb_chunks WHERE chunk_id = ?1 LIMIT 1", [chunk_id])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    async fn insert_kb_chunk(&self, chunk: &KbChunk) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO kb_chunks (chunk_id, title, tags, content, source) VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    chunk.chunk_id.as_str(),
                    chunk.title.as_str(),
                    chunk.tags.as_str(),
                    chunk.content.as_str(),
                    chunk.source.as_str()
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_service, test_service_with_fixtures};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn seed_is_idempotent() {
        let svc = test_service().await.unwrap();
        assert_eq!(svc.kb_chunk_count().await.unwrap(), 3);
        assert_eq!(svc.seed_kb().await.unwrap(), 0);
        assert_eq!(svc.kb_chunk_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn upsert_replaces_by_chunk_id() {
        let svc = test_service_with_fixtures("unused").await.unwrap();
        let mut chunk = seed_chunks().remove(0);
        svc.upsert_kb_chunk(&chunk).await.unwrap();
        chunk.title = "Runbook: Payments v2".into();
        svc.upsert_kb_chunk(&chunk).await.unwrap();

        assert_eq!(svc.kb_chunk_count().await.unwrap(), 1);
        let hits = svc.search_kb_chunks("\"gateway\"", 5).await.unwrap();
        assert_eq!(hits[0].title, "Runbook: Payments v2");
    }

    #[tokio::test]
    async fn match_ranks_and_scores_positive() {
        let svc = test_service().await.unwrap();
        let hits = svc
            .search_kb_chunks("\"gateway\" OR \"timeout\"", 10)
            .await
            .unwrap();
        assert_eq!(hits[0].chunk_id, "rb-payments-001");
        assert!(hits[0].score > 0.0);
        assert!(hits[0].snippet.contains("Mitigations"));
    }

    #[tokio::test]
    async fn porter_stemming_matches_inflections() {
        let svc = test_service().await.unwrap();
        let hits = svc.search_kb_chunks("\"failures\"", 3).await.unwrap();
        assert!(hits.iter().any(|h| h.chunk_id == "pol-sev-001"));
    }

    #[tokio::test]
    async fn limit_is_honoured() {
        let svc = test_service().await.unwrap();
        let hits = svc
            .search_kb_chunks("\"sev\" OR \"comms\" OR \"gateway\"", 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }
}
