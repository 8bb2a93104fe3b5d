//! Entity structs for the incident service.
//!
//! Incidents, notes, and approval requests map to tables in the libSQL
//! database. KB chunks map to the FTS5 `kb_chunks` table. Evidence bundles
//! are never persisted; they are assembled from fixture files on demand.
//! Alerts arrive from monitoring and are only carried through.
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema`.

mod alert;
mod approval;
mod evidence;
mod incident;
mod kb;
mod note;

pub use alert::Alert;
pub use approval::{ApprovalRequest, NewApproval};
pub use evidence::{Evidence, EvidenceBundle};
pub use incident::{Incident, NewIncident, Owner};
pub use kb::{KbChunk, KbHit};
pub use note::{NewNote, Note};
