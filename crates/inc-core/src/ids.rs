//! ID prefixes for generated identifiers.
//!
//! IDs are produced by the database as `{PREFIX}-{8 upper hex chars}`,
//! e.g. `INC-3FA2B81C`.

pub const PREFIX_INCIDENT: &str = "INC";
pub const PREFIX_NOTE: &str = "NOTE";
pub const PREFIX_APPROVAL: &str = "APR";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_INCIDENT, PREFIX_NOTE, PREFIX_APPROVAL];
