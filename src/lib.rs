//! Assistant Relay - HTTP front for a hosted conversational assistant
//!
//! This crate relays chat messages to a remote assistant service, waits for
//! each run to complete by polling with exponential backoff, and returns the
//! assistant's reply together with the conversation thread id.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
