//! # inc-server
//!
//! HTTP surface of the incident response service. [`AppState`] wires the
//! incident service, agent loop, and chat gateway from an
//! [`IncidentConfig`](inc_config::IncidentConfig); [`router`] exposes them
//! as JSON endpoints with errors mapped by [`AppError`].

pub mod error;
pub mod routes;
pub mod state;

pub use error::{AppError, StartupError};
pub use routes::{router, router_with_timeout};
pub use state::AppState;
