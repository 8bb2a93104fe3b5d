//! # inc-evidence
//!
//! Canned evidence for the incident service. Each incident type owns a
//! directory of four JSON fixtures:
//!
//! ```text
//! <root>/<incident_type>/logs.json
//! <root>/<incident_type>/metrics.json
//! <root>/<incident_type>/changes.json
//! <root>/<incident_type>/runbook.json
//! ```
//!
//! [`FixtureStore`] reads them; [`summarize_fixtures`] turns them into a
//! deterministic [`IncidentSummary`](inc_core::summary::IncidentSummary) for
//! use when the model path is unavailable or has aborted.

pub mod error;
pub mod store;
pub mod summary;

pub use error::FixtureError;
pub use store::{FIXTURE_FILES, FixtureStore};
pub use summary::{SummaryContext, summarize_evidence, summarize_fixtures};
