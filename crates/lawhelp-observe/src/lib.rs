//! Observability setup for LawHelp: structured logging with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
