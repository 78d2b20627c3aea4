//! Registry of currently open subscriber connections.
//!
//! Each accepted WebSocket is represented by a [`ConnectionHandle`]: its
//! identity plus the sending half of a bounded outbound queue. The socket
//! writer task owns the receiving half, so a handle is open exactly as long
//! as that task is alive.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use crate::domain::ConnectionId;

/// One serialized envelope, shared by every recipient of a broadcast.
pub type Frame = Arc<str>;

/// Why a frame could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The connection's writer has gone away.
    Closed,
    /// The outbound queue is full; the frame is dropped for this connection.
    QueueFull,
}

/// Handle to one accepted connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Creates a handle with a fresh identity and a bounded queue, returning
    /// the receiving half for the socket writer.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: ConnectionId::new(),
            outbound,
        };
        (handle, rx)
    }

    /// Returns the connection identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while the socket writer is still draining the queue.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queues `frame` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryFailure::Closed`] if the writer has gone away and
    /// [`DeliveryFailure::QueueFull`] if the connection is not keeping up.
    pub fn try_deliver(&self, frame: &Frame) -> Result<(), DeliveryFailure> {
        self.outbound
            .try_send(Arc::clone(frame))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Closed(_) => DeliveryFailure::Closed,
                mpsc::error::TrySendError::Full(_) => DeliveryFailure::QueueFull,
            })
    }
}

/// Exact set of currently open connections.
///
/// Operations never fail and do not probe connection health beyond set
/// membership. Guarded by a [`tokio::sync::RwLock`]: lifecycle events take
/// the write lock, broadcasts take a read lock just long enough to copy a
/// snapshot.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a newly accepted connection. It is a broadcast target as soon
    /// as this returns.
    pub async fn register(&self, handle: ConnectionHandle) {
        let id = handle.id();
        let mut conns = self.connections.write().await;
        let _ = conns.insert(id, handle);
        tracing::debug!(conn_id = %id, size = conns.len(), "connection registered");
    }

    /// Removes a connection. Removing an absent connection is a no-op.
    ///
    /// Returns `true` if the connection was present.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut conns = self.connections.write().await;
        let removed = conns.remove(&id).is_some();
        if removed {
            tracing::debug!(conn_id = %id, size = conns.len(), "connection unregistered");
        }
        removed
    }

    /// Returns the number of registered connections.
    pub async fn size(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Returns a copy of the current handles.
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Drops every handle, returning how many were registered.
    ///
    /// Writers observe their queue closing once the last sender is gone and
    /// close their sockets.
    pub async fn clear(&self) -> usize {
        let mut conns = self.connections.write().await;
        let n = conns.len();
        conns.clear();
        n
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_makes_connection_visible() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = ConnectionHandle::channel(4);
        let id = handle.id();
        registry.register(handle).await;

        assert_eq!(registry.size().await, 1);
        let snapshot = registry.snapshot().await;
        assert!(snapshot.iter().any(|h| h.id() == id));
    }

    #[tokio::test]
    async fn unregister_twice_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = ConnectionHandle::channel(4);
        let (b, _rx_b) = ConnectionHandle::channel(4);
        let id = a.id();
        registry.register(a).await;
        registry.register(b).await;

        assert!(registry.unregister(id).await);
        assert_eq!(registry.size().await, 1);
        assert!(!registry.unregister(id).await);
        assert_eq!(registry.size().await, 1);
    }

    #[tokio::test]
    async fn unregister_unknown_connection_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = ConnectionHandle::channel(4);
        registry.register(a).await;

        assert!(!registry.unregister(ConnectionId::new()).await);
        assert_eq!(registry.size().await, 1);
    }

    #[tokio::test]
    async fn clear_closes_queues() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx) = ConnectionHandle::channel(4);
        registry.register(a).await;

        assert_eq!(registry.clear().await, 1);
        assert_eq!(registry.size().await, 0);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn handle_reports_closed_after_receiver_drops() {
        let (handle, rx) = ConnectionHandle::channel(1);
        assert!(handle.is_open());
        drop(rx);
        assert!(!handle.is_open());
        let frame: Frame = Arc::from("x");
        assert_eq!(handle.try_deliver(&frame), Err(DeliveryFailure::Closed));
    }

    #[test]
    fn full_queue_is_reported() {
        let (handle, _rx) = ConnectionHandle::channel(1);
        let frame: Frame = Arc::from("x");
        assert_eq!(handle.try_deliver(&frame), Ok(()));
        assert_eq!(handle.try_deliver(&frame), Err(DeliveryFailure::QueueFull));
    }
}
