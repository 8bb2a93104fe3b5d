//! # inc-slack
//!
//! Alerting and approval gateway for the incident service:
//! - [`AlertGateway::post_alert`] stores a pending approval and posts an
//!   interactive alert with "Initiate" / "Ignore" buttons
//! - [`AlertGateway::handle_action`] verifies the callback signature, decides
//!   the approval, runs the agent loop, and replies in the alert's thread
//!
//! Messages go out through the [`ChatClient`] trait; [`SlackClient`] is the
//! Web API implementation.

pub mod action;
pub mod client;
pub mod error;
pub mod format;
pub mod gateway;
pub mod signature;

pub use action::{ActionPayload, encode_form_payload, parse_form_payload};
pub use client::{ChatClient, ChatMessage, MessageRef, SlackClient};
pub use error::GatewayError;
pub use gateway::{ActionHeaders, ActionOutcome, AlertGateway, PostedAlert};
pub use signature::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};
