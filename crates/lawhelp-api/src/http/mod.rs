//! HTTP/REST API layer for LawHelp.
//!
//! Axum-based REST API at `/api/v1/` with bearer JWT authentication,
//! envelope response format, and CORS support. The chat protocol itself is
//! served over WebSocket at `/ws`.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
