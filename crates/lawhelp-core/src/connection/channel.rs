//! Channel trait: one long-lived bidirectional envelope stream per client.

use lawhelp_types::envelope::{ClientEnvelope, ServerEnvelope};
use lawhelp_types::error::{ChannelError, EnvelopeError};

/// One inbound frame as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl InboundFrame {
    /// Decode into a typed envelope. Binary frames are never valid envelopes.
    pub fn decode(&self) -> Result<ClientEnvelope, EnvelopeError> {
        match self {
            InboundFrame::Text(text) => ClientEnvelope::decode(text),
            InboundFrame::Binary(_) => Err(EnvelopeError::Malformed),
        }
    }
}

/// Transport seam for the protocol.
///
/// `recv` must be cancel-safe: the lifecycle task polls it inside
/// `tokio::select!` next to the handshake deadline and the push outbox.
pub trait Channel: Send {
    /// Next inbound frame. `None` once the peer has closed the channel.
    fn recv(
        &mut self,
    ) -> impl std::future::Future<Output = Option<Result<InboundFrame, ChannelError>>> + Send;

    /// Send one envelope. Fails once the channel is closed.
    fn send(
        &mut self,
        envelope: &ServerEnvelope,
    ) -> impl std::future::Future<Output = Result<(), ChannelError>> + Send;

    /// Close the channel from the server side. Must tolerate repeated calls.
    fn close(&mut self) -> impl std::future::Future<Output = ()> + Send;
}
