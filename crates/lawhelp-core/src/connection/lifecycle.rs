//! Connection lifecycle: handshake, dispatch loop, and teardown.
//!
//! One [`ConnectionManager::run`] call owns one channel from accept to close.
//! Frames of a connection are processed strictly one at a time, so a second
//! `user_message` waits until the first one's `ai_response` (or `error`) has
//! been sent.

use std::sync::Arc;
use std::time::Duration;

use lawhelp_types::envelope::ServerEnvelope;
use lawhelp_types::error::DispatchError;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::answer::engine::AnswerEngine;
use crate::auth::verifier::IdentityVerifier;
use crate::chat::repository::{SessionStore, TurnPersister};
use crate::connection::channel::Channel;
use crate::connection::dispatcher::MessageDispatcher;
use crate::connection::registry::ConnectionRegistry;
use crate::connection::state::{Connection, Transition};

/// Default deadline for the `auth` envelope.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a connection task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The handshake was refused or timed out.
    Rejected,
    /// The peer closed the channel.
    PeerClosed,
    /// Sending or receiving failed.
    ChannelFailed,
    /// The registry was shut down.
    ServerShutdown,
}

/// Drives connections through the protocol.
///
/// Cheap to clone; every clone shares the verifier, dispatcher, and registry.
pub struct ConnectionManager<V, S, P, A>
where
    V: IdentityVerifier,
    S: SessionStore,
    P: TurnPersister,
    A: AnswerEngine,
{
    verifier: Arc<V>,
    dispatcher: Arc<MessageDispatcher<S, P, A>>,
    registry: Arc<ConnectionRegistry>,
    handshake_timeout: Duration,
}

impl<V, S, P, A> Clone for ConnectionManager<V, S, P, A>
where
    V: IdentityVerifier,
    S: SessionStore,
    P: TurnPersister,
    A: AnswerEngine,
{
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            dispatcher: self.dispatcher.clone(),
            registry: self.registry.clone(),
            handshake_timeout: self.handshake_timeout,
        }
    }
}

impl<V, S, P, A> ConnectionManager<V, S, P, A>
where
    V: IdentityVerifier,
    S: SessionStore,
    P: TurnPersister,
    A: AnswerEngine,
{
    pub fn new(
        verifier: Arc<V>,
        dispatcher: Arc<MessageDispatcher<S, P, A>>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            verifier,
            dispatcher,
            registry,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Serve one channel until it closes. Teardown always runs exactly once.
    pub async fn run<C: Channel>(&self, channel: C) -> CloseReason {
        let mut conn = Connection::new();
        let span = info_span!("connection", connection_id = %conn.id());
        async move {
            debug!("Connection opened");
            let mut channel = channel;
            let reason = self.drive(&mut conn, &mut channel).await;

            if let Some(subject) = conn.close() {
                self.registry.deregister(&subject, conn.id());
            }
            channel.close().await;
            info!(?reason, "Connection closed");
            reason
        }
        .instrument(span)
        .await
    }

    async fn drive<C: Channel>(&self, conn: &mut Connection, channel: &mut C) -> CloseReason {
        let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<ServerEnvelope>();
        let mut outbox_tx = Some(outbox_tx);

        let deadline = tokio::time::sleep(self.handshake_timeout);
        tokio::pin!(deadline);

        loop {
            if conn.is_closed() {
                return CloseReason::Rejected;
            }

            if !conn.is_authenticated() {
                let transition = tokio::select! {
                    _ = &mut deadline => conn.on_handshake_timeout(),
                    frame = channel.recv() => match frame {
                        Some(Ok(frame)) => conn.on_handshake_frame(&frame, self.verifier.as_ref()),
                        Some(Err(err)) => {
                            warn!(error = %err, "Receive failed during handshake");
                            return CloseReason::ChannelFailed;
                        }
                        None => return CloseReason::PeerClosed,
                    },
                };

                match transition {
                    Transition::Reply(envelope) => {
                        if channel.send(&envelope).await.is_err() {
                            return CloseReason::ChannelFailed;
                        }
                    }
                    Transition::Reject(envelope) => {
                        // Best effort: the connection closes either way.
                        let _ = channel.send(&envelope).await;
                        return CloseReason::Rejected;
                    }
                    Transition::Ignore => return CloseReason::Rejected,
                    Transition::Promote { subject_id, reply } => {
                        if channel.send(&reply).await.is_err() {
                            return CloseReason::ChannelFailed;
                        }
                        if let Some(tx) = outbox_tx.take() {
                            if !self.registry.register(subject_id, conn.id(), tx) {
                                return CloseReason::ServerShutdown;
                            }
                        }
                    }
                }
                continue;
            }

            tokio::select! {
                frame = channel.recv() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(err)) => {
                            warn!(error = %err, "Receive failed");
                            return CloseReason::ChannelFailed;
                        }
                        None => return CloseReason::PeerClosed,
                    };

                    let envelope = match frame.decode() {
                        Ok(envelope) => envelope,
                        Err(err) => {
                            debug!(error = %err, "Rejected inbound frame");
                            let reply = ServerEnvelope::error(DispatchError::from(err).client_message());
                            if channel.send(&reply).await.is_err() {
                                return CloseReason::ChannelFailed;
                            }
                            continue;
                        }
                    };

                    let Some(ctx) = conn.authenticated_mut() else {
                        continue;
                    };
                    if self.dispatcher.dispatch(envelope, ctx, channel).await.is_err() {
                        return CloseReason::ChannelFailed;
                    }
                }
                pushed = outbox_rx.recv() => match pushed {
                    Some(envelope) => {
                        if channel.send(&envelope).await.is_err() {
                            return CloseReason::ChannelFailed;
                        }
                    }
                    None => return CloseReason::ServerShutdown,
                },
            }
        }
    }
}
