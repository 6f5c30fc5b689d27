//! HTTP request handlers for the REST API and the WebSocket endpoint.

pub mod chatbot;
pub mod session;
pub mod ws;
