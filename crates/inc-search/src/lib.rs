//! # inc-search
//!
//! Keyword search over the knowledge base chunks stored in `inc-db`.
//!
//! User text is never handed to FTS5 as-is: [`query::build_match_query`]
//! extracts word tokens, quotes them so FTS5 operators are inert, applies
//! the severity rewrite, requires every remaining word (implicit AND), and
//! ORs incident-type/service boosts around that expression.

pub mod error;
pub mod kb;
pub mod query;

pub use error::SearchError;
pub use kb::{DEFAULT_TOP_K, KbQuery, KbSearchResponse, MAX_TOP_K, kb_search};
