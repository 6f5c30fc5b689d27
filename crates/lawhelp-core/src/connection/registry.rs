//! Registry of authenticated connections, keyed by subject.
//!
//! One `ConnectionRegistry` is created at server start, shared by every
//! connection task, and shut down when the server stops. Each registered
//! connection contributes an unbounded outbox sender so the server can push
//! envelopes to a subject outside the request/response flow. A subject may
//! hold any number of concurrent connections (several browser tabs).

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use lawhelp_types::envelope::ServerEnvelope;
use lawhelp_types::identity::SubjectId;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque per-channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sender half of a connection's push outbox.
pub type Outbox = mpsc::UnboundedSender<ServerEnvelope>;

/// Concurrent subject -> connections map with a defined lifecycle.
pub struct ConnectionRegistry {
    subjects: DashMap<SubjectId, HashMap<ConnectionId, Outbox>>,
    shut_down: AtomicBool,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            subjects: DashMap::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Register an authenticated connection.
    ///
    /// Returns `false` (and drops the outbox) once the registry has been shut
    /// down, which makes the connection observe a closed outbox and exit.
    pub fn register(&self, subject: SubjectId, id: ConnectionId, outbox: Outbox) -> bool {
        if self.shut_down.load(Ordering::SeqCst) {
            warn!(%subject, connection_id = %id, "Registry shut down, refusing registration");
            return false;
        }
        self.subjects
            .entry(subject.clone())
            .or_default()
            .insert(id, outbox);

        // A shutdown that raced the insert may have cleared the map before it
        // landed; whichever side observes the flag last removes the entry.
        if self.shut_down.load(Ordering::SeqCst) {
            self.remove_entry(&subject, id);
            warn!(%subject, connection_id = %id, "Registry shut down during registration");
            return false;
        }
        debug!(%subject, connection_id = %id, "Connection registered");
        true
    }

    /// Remove a connection. Returns whether it was registered.
    pub fn deregister(&self, subject: &SubjectId, id: ConnectionId) -> bool {
        let removed = self.remove_entry(subject, id);
        if removed {
            debug!(%subject, connection_id = %id, "Connection deregistered");
        }
        removed
    }

    fn remove_entry(&self, subject: &SubjectId, id: ConnectionId) -> bool {
        let removed = match self.subjects.get_mut(subject) {
            Some(mut connections) => connections.remove(&id).is_some(),
            None => false,
        };
        // The shard guard above is released before this second lookup.
        self.subjects
            .remove_if(subject, |_, connections| connections.is_empty());
        removed
    }

    /// Number of live connections held by a subject.
    pub fn connection_count(&self, subject: &SubjectId) -> usize {
        self.subjects
            .get(subject)
            .map(|connections| connections.len())
            .unwrap_or(0)
    }

    pub fn is_online(&self, subject: &SubjectId) -> bool {
        self.connection_count(subject) > 0
    }

    /// Total live connections across all subjects.
    pub fn total_connections(&self) -> usize {
        self.subjects.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of distinct subjects with at least one live connection.
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }

    /// Push an envelope to every live connection of a subject.
    ///
    /// Returns how many outboxes accepted it. Outboxes whose connection task
    /// has already exited are skipped; their entries are cleaned up by that
    /// task's own teardown.
    pub fn push(&self, subject: &SubjectId, envelope: &ServerEnvelope) -> usize {
        match self.subjects.get(subject) {
            Some(connections) => connections
                .values()
                .filter(|outbox| outbox.send(envelope.clone()).is_ok())
                .count(),
            None => 0,
        }
    }

    /// Drop every outbox and refuse further registrations.
    ///
    /// Connection tasks see their outbox close and tear themselves down.
    /// Returns the number of connections that were live.
    pub fn shutdown(&self) -> usize {
        self.shut_down.store(true, Ordering::SeqCst);
        let live = self.total_connections();
        self.subjects.clear();
        live
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn outbox() -> (Outbox, mpsc::UnboundedReceiver<ServerEnvelope>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_and_deregister() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let id = ConnectionId::new();
        let (tx, _rx) = outbox();

        assert!(registry.register(subject.clone(), id, tx));
        assert!(registry.is_online(&subject));
        assert_eq!(registry.total_connections(), 1);

        assert!(registry.deregister(&subject, id));
        assert!(!registry.is_online(&subject));
        assert_eq!(registry.subject_count(), 0);
    }

    #[test]
    fn test_deregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let id = ConnectionId::new();
        let (tx, _rx) = outbox();
        registry.register(subject.clone(), id, tx);

        assert!(registry.deregister(&subject, id));
        assert!(!registry.deregister(&subject, id));
        assert!(!registry.deregister(&SubjectId::new("nobody"), id));
    }

    #[test]
    fn test_subject_with_multiple_connections() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let (tx_a, _rx_a) = outbox();
        let (tx_b, _rx_b) = outbox();
        registry.register(subject.clone(), a, tx_a);
        registry.register(subject.clone(), b, tx_b);
        assert_eq!(registry.connection_count(&subject), 2);

        registry.deregister(&subject, a);
        assert_eq!(registry.connection_count(&subject), 1);
        assert_eq!(registry.subject_count(), 1);
    }

    #[test]
    fn test_push_fans_out_to_all_connections() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let (tx_a, mut rx_a) = outbox();
        let (tx_b, mut rx_b) = outbox();
        registry.register(subject.clone(), ConnectionId::new(), tx_a);
        registry.register(subject.clone(), ConnectionId::new(), tx_b);

        let notice = ServerEnvelope::error("maintenance in 5 minutes");
        assert_eq!(registry.push(&subject, &notice), 2);
        assert_eq!(rx_a.try_recv().unwrap(), notice);
        assert_eq!(rx_b.try_recv().unwrap(), notice);
        assert_eq!(registry.push(&SubjectId::new("u2"), &notice), 0);
    }

    #[test]
    fn test_push_skips_dead_outboxes() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let (tx, rx) = outbox();
        registry.register(subject.clone(), ConnectionId::new(), tx);
        drop(rx);
        assert_eq!(registry.push(&subject, &ServerEnvelope::error("x")), 0);
    }

    #[test]
    fn test_shutdown_closes_outboxes_and_refuses_registration() {
        let registry = ConnectionRegistry::new();
        let subject = SubjectId::new("u1");
        let (tx, mut rx) = outbox();
        registry.register(subject.clone(), ConnectionId::new(), tx);

        assert_eq!(registry.shutdown(), 1);
        assert!(registry.is_shut_down());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        let (tx, _rx) = outbox();
        assert!(!registry.register(subject, ConnectionId::new(), tx));
        assert_eq!(registry.total_connections(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_register_deregister() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();

        for i in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let subject = SubjectId::new(format!("u{}", i % 4));
                let id = ConnectionId::new();
                let (tx, _rx) = mpsc::unbounded_channel();
                registry.register(subject.clone(), id, tx);
                tokio::task::yield_now().await;
                registry.deregister(&subject, id)
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(registry.total_connections(), 0);
        assert_eq!(registry.subject_count(), 0);
    }

    #[test]
    fn test_register_racing_shutdown_leaves_nothing_behind() {
        for _ in 0..200 {
            let registry = Arc::new(ConnectionRegistry::new());
            let barrier = Arc::new(std::sync::Barrier::new(5));

            let registrars: Vec<_> = (0..4)
                .map(|i| {
                    let registry = registry.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        let (tx, rx) = mpsc::unbounded_channel();
                        barrier.wait();
                        registry.register(SubjectId::new(format!("u{i}")), ConnectionId::new(), tx);
                        rx
                    })
                })
                .collect();

            barrier.wait();
            registry.shutdown();

            for handle in registrars {
                let mut rx = handle.join().unwrap();
                assert!(matches!(
                    rx.try_recv(),
                    Err(mpsc::error::TryRecvError::Disconnected)
                ));
            }
            assert_eq!(registry.total_connections(), 0);
        }
    }
}
