//! Infrastructure layer for LawHelp.
//!
//! Contains implementations of the ports defined in `lawhelp-core`: SQLite
//! storage for sessions and turns, HS256 JWT verification, and the
//! OpenAI-compatible answer engine. Also loads configuration and resolves
//! the data directory.

pub mod answer;
pub mod auth;
pub mod config;
pub mod filesystem;
pub mod sqlite;
