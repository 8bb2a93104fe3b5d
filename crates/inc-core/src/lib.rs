//! # inc-core
//!
//! Core types shared by every crate of the incident service:
//! - Entity structs (incidents, notes, approval requests, KB chunks)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Severity classification and default owners per incident type
//! - The structured incident summary produced by the agent loop
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod routing;
pub mod summary;
