//! Repository modules implementing the service operations.
//!
//! Each module adds methods to `IncidentService` via `impl IncidentService` blocks.

pub mod approval;
pub mod incident;
pub mod kb;
pub mod note;
