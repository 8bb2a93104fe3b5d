//! Note repository: append-only notes on incidents.

use chrono::Utc;

use inc_core::entities::{NewNote, Note};
use inc_core::errors::CoreError;
use inc_core::ids::PREFIX_NOTE;

use crate::error::{DatabaseError, ServiceError};
use crate::helpers::{get_opt_string, non_blank, parse_datetime, parse_optional_json, to_json_text};
use crate::service::IncidentService;

const SELECT_COLS: &str = "id, incident_id, author, body, kind, title, payload, created_at";

fn row_to_note(row: &libsql::Row) -> Result<Note, DatabaseError> {
    Ok(Note {
        id: row.get(0)?,
        incident_id: row.get(1)?,
        author: row.get(2)?,
        body: row.get(3)?,
        kind: row.get(4)?,
        title: get_opt_string(row, 5)?,
        payload: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl IncidentService {
    /// Append a note to an existing incident.
    ///
    /// # Errors
    ///
    /// - `CoreError::Validation` for a blank author or body.
    /// - `CoreError::NotFound` if the incident does not exist.
    pub async fn add_note(&self, incident_id: &str, input: NewNote) -> Result<Note, ServiceError> {
        let author = input.author.trim();
        let body = input.body.trim();
        if author.is_empty() {
            return Err(CoreError::Validation("note author must not be empty".into()).into());
        }
        if body.is_empty() {
            return Err(CoreError::Validation("note body must not be empty".into()).into());
        }
        self.get_incident(incident_id).await?;

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_NOTE).await?;
        let kind = non_blank(Some(input.kind.as_str())).unwrap_or_else(|| "comment".into());
        let payload = input.payload.as_ref().map(to_json_text).transpose()?;

        self.db()
            .conn()
            .execute(
                "INSERT INTO incident_notes (id, incident_id, author, body, kind, title, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                libsql::params![
                    id.as_str(),
                    incident_id,
                    author,
                    body,
                    kind.as_str(),
                    input.title.as_deref(),
                    payload,
                    now.to_rfc3339()
                ],
            )
            .await?;

        tracing::debug!(incident_id, note_id = %id, %kind, "note added");
        Ok(Note {
            id,
            incident_id: incident_id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            kind,
            title: input.title,
            payload: input.payload,
            created_at: now,
        })
    }

    /// Notes for an incident in the order they were written.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if the incident does not exist.
    pub async fn list_notes(&self, incident_id: &str) -> Result<Vec<Note>, ServiceError> {
        self.get_incident(incident_id).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM incident_notes WHERE incident_id = ?1 ORDER BY created_at, rowid"
                ),
                [incident_id],
            )
            .await?;

        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(row_to_note(&row)?);
        }
        Ok(notes)
    }
}
