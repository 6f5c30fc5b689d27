//! Session protocol and collaborator trait definitions for LawHelp.
//!
//! This crate defines the "ports" (verifier, repository, and answer engine
//! traits) that the infrastructure layer implements, plus the per-connection
//! state machine and message dispatcher that drive the chat protocol. It
//! depends only on `lawhelp-types` -- never on `lawhelp-infra` or any
//! database/IO crate.

pub mod answer;
pub mod auth;
pub mod chat;
pub mod connection;

#[cfg(test)]
pub(crate) mod testing;
