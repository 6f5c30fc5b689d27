//! Real-time session protocol.
//!
//! - [`channel`]: the bidirectional transport seam (WebSocket in production).
//! - [`state`]: the explicit per-connection state machine and handshake.
//! - [`dispatcher`]: validation, authorization, and sequencing of
//!   authenticated `user_message` envelopes.
//! - [`registry`]: process-wide subject -> live connection registry.
//! - [`lifecycle`]: the per-connection task tying the above together.

pub mod channel;
pub mod dispatcher;
pub mod lifecycle;
pub mod registry;
pub mod state;
