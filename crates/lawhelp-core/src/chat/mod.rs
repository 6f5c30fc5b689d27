//! Chat session and conversation turn persistence abstractions for LawHelp.
//!
//! This module defines the `SessionStore` and `TurnPersister` traits that the
//! infrastructure layer implements, and the `ChatService` used by the HTTP
//! and CLI surfaces for session management outside the live protocol.

pub mod repository;
pub mod service;
