//! Domain layer containing the relay's domain types.
//!
//! # Module Organization
//!
//! - `thread` - Conversation threads, runs, run statuses and messages

pub mod thread;
