//! Approval repository: a FIFO of pending human decisions.
//!
//! Each request leaves `pending` exactly once; the decision is a single
//! `UPDATE` guarded on [`ApprovalState::sources_of`] so concurrent deciders
//! cannot both win.

use chrono::Utc;

use inc_core::entities::{ApprovalRequest, NewApproval};
use inc_core::enums::ApprovalState;
use inc_core::errors::CoreError;
use inc_core::ids::PREFIX_APPROVAL;

use crate::error::{DatabaseError, ServiceError};
use crate::helpers::{
    get_opt_string, non_blank, parse_datetime, parse_enum, parse_optional_datetime,
    parse_optional_json, state_guard, to_json_text,
};
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_id, state, requested_at, decided_at, decided_by, channel_id, thread_ts, alert";

fn row_to_approval(row: &libsql::Row) -> Result<ApprovalRequest, DatabaseError> {
    Ok(ApprovalRequest {
        id: row.get(0)?,
        incident_id: row.get(1)?,
        state: parse_enum(&row.get::<String>(2)?)?,
        requested_at: parse_datetime(&row.get::<String>(3)?)?,
        decided_at: parse_optional_datetime(get_opt_string(row, 4)?.as_deref())?,
        decided_by: get_opt_string(row, 5)?,
        channel_id: get_opt_string(row, 6)?,
        thread_ts: get_opt_string(row, 7)?,
        alert: parse_optional_json(get_opt_string(row, 8)?.as_deref())?,
    })
}

impl IncidentService {
    /// Enqueue a pending approval for an existing incident.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if the incident does not exist.
    pub async fn enqueue_approval(
        &self,
        input: NewApproval,
    ) -> Result<ApprovalRequest, ServiceError> {
        self.get_incident(&input.incident_id).await?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_APPROVAL).await?;
        let channel_id = non_blank(input.channel_id.as_deref());
        let thread_ts = non_blank(input.thread_ts.as_deref());
        let alert = input.alert.as_ref().map(to_json_text).transpose()?;

        self.db()
            .conn()
            .execute(
                "INSERT INTO approval_requests (id, incident_id, state, requested_at, channel_id, thread_ts, alert)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    input.incident_id.as_str(),
                    ApprovalState::Pending.as_str(),
                    now.to_rfc3339(),
                    channel_id.as_deref(),
                    thread_ts.as_deref(),
                    alert
                ],
            )
            .await?;

        tracing::info!(approval_id = %id, incident_id = %input.incident_id, "approval enqueued");
        Ok(ApprovalRequest {
            id,
            incident_id: input.incident_id,
            state: ApprovalState::Pending,
            requested_at: now,
            decided_at: None,
            decided_by: None,
            channel_id,
            thread_ts,
            alert: input.alert,
        })
    }

    /// # Errors
    ///
    /// `CoreError::NotFound` if no approval has this id.
    pub async fn get_approval(&self, id: &str) -> Result<ApprovalRequest, ServiceError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM approval_requests WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| CoreError::not_found("approval", id))?;
        Ok(row_to_approval(&row)?)
    }

    /// The oldest pending approval, if any. Does not change its state.
    pub async fn next_pending_approval(&self) -> Result<Option<ApprovalRequest>, ServiceError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM approval_requests WHERE state = ?1
                     ORDER BY requested_at, rowid LIMIT 1"
                ),
                [ApprovalState::Pending.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_approval(&row)?)),
            None => Ok(None),
        }
    }

    /// Decide a pending approval.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` if `decision` is `pending`.
    /// - `CoreError::NotFound` for an unknown id.
    /// - `CoreError::InvalidTransition` if the approval was already decided.
    pub async fn decide_approval(
        &self,
        id: &str,
        decision: ApprovalState,
        decided_by: Option<&str>,
    ) -> Result<ApprovalRequest, ServiceError> {
        if !decision.is_terminal() {
            return Err(CoreError::Validation(format!(
                "decision must be approved or rejected, got {decision}"
            ))
            .into());
        }

        let guard = state_guard(
            "state",
            ApprovalState::sources_of(decision)
                .into_iter()
                .map(ApprovalState::as_str),
        );
        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE approval_requests SET state = ?1, decided_at = ?2, decided_by = ?3
                     WHERE id = ?4 AND {guard}"
                ),
                libsql::params![
                    decision.as_str(),
                    now.to_rfc3339(),
                    non_blank(decided_by),
                    id
                ],
            )
            .await?;

        if changed == 0 {
            let current = self.get_approval(id).await?;
            return Err(CoreError::InvalidTransition {
                entity_type: "approval".into(),
                id: id.to_string(),
                from: current.state.to_string(),
                to: decision.to_string(),
            }
            .into());
        }

        tracing::info!(approval_id = id, %decision, "approval decided");
        self.get_approval(id).await
    }

    /// Record where the approval prompt was posted.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` for an unknown id.
    pub async fn set_approval_message(
        &self,
        id: &str,
        channel_id: &str,
        thread_ts: &str,
    ) -> Result<ApprovalRequest, ServiceError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE approval_requests SET channel_id = ?1, thread_ts = ?2 WHERE id = ?3",
                libsql::params![channel_id, thread_ts, id],
            )
            .await?;
        if changed == 0 {
            return Err(CoreError::not_found("approval", id).into());
        }
        self.get_approval(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_service;
    use inc_core::entities::NewIncident;
    use pretty_assertions::assert_eq;

    async fn incident_id(svc: &IncidentService) -> String {
        svc.create_incident(NewIncident::of_type("payments_failing"))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn next_is_oldest_pending_and_not_mutated() {
        let svc = test_service().await.unwrap();
        let inc = incident_id(&svc).await;
        let first = svc
            .enqueue_approval(NewApproval::for_incident(&inc))
            .await
            .unwrap();
        let second = svc
            .enqueue_approval(NewApproval {
                alert: Some(serde_json::json!({"alert_id": "A2"})),
                ..NewApproval::for_incident(&inc)
            })
            .await
            .unwrap();

        let peek = svc.next_pending_approval().await.unwrap().unwrap();
        assert_eq!(peek.id, first.id);
        let again = svc.next_pending_approval().await.unwrap().unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.state, ApprovalState::Pending);

        svc.decide_approval(&first.id, ApprovalState::Approved, Some("alice"))
            .await
            .unwrap();
        let next = svc.next_pending_approval().await.unwrap().unwrap();
        assert_eq!(next.id, second.id);
        assert_eq!(next.alert, Some(serde_json::json!({"alert_id": "A2"})));
    }

    #[tokio::test]
    async fn decision_happens_exactly_once() {
        let svc = test_service().await.unwrap();
        let inc = incident_id(&svc).await;
        let apr = svc
            .enqueue_approval(NewApproval::for_incident(&inc))
            .await
            .unwrap();

        let decided = svc
            .decide_approval(&apr.id, ApprovalState::Rejected, Some("bob"))
            .await
            .unwrap();
        assert_eq!(decided.state, ApprovalState::Rejected);
        assert_eq!(decided.decided_by.as_deref(), Some("bob"));
        assert!(decided.decided_at.is_some());

        let err = svc
            .decide_approval(&apr.id, ApprovalState::Approved, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(
            svc.get_approval(&apr.id).await.unwrap().state,
            ApprovalState::Rejected
        );
        assert!(svc.next_pending_approval().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pending_is_not_a_decision() {
        let svc = test_service().await.unwrap();
        let inc = incident_id(&svc).await;
        let apr = svc
            .enqueue_approval(NewApproval::for_incident(&inc))
            .await
            .unwrap();
        assert!(matches!(
            svc.decide_approval(&apr.id, ApprovalState::Pending, None).await,
            Err(ServiceError::Core(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn approval_requires_incident() {
        let svc = test_service().await.unwrap();
        let err = svc
            .enqueue_approval(NewApproval::for_incident("INC-00000000"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(svc
            .decide_approval("APR-00000000", ApprovalState::Approved, None)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn message_location_is_recorded() {
        let svc = test_service().await.unwrap();
        let inc = incident_id(&svc).await;
        let apr = svc
            .enqueue_approval(NewApproval::for_incident(&inc))
            .await
            .unwrap();
        let updated = svc
            .set_approval_message(&apr.id, "C123", "1700000000.000100")
            .await
            .unwrap();
        assert_eq!(updated.channel_id.as_deref(), Some("C123"));
        assert_eq!(updated.thread_ts.as_deref(), Some("1700000000.000100"));
    }
}
