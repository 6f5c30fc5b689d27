//! Shared domain types for LawHelp.
//!
//! This crate contains the types used across the LawHelp server:
//! chat sessions and turns, authenticated subjects, the WebSocket protocol
//! envelopes, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod envelope;
pub mod error;
pub mod identity;
