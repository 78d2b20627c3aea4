//! In-process fan-out of received envelopes.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The client
//! subscriber publishes every decoded [`Envelope`] through the bus, and any
//! number of local consumers (widgets, loggers) subscribe to it. There is
//! no keying: every subscriber sees every envelope.

use tokio::sync::broadcast;

use super::Envelope;

/// Broadcast bus for [`Envelope`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity.
/// When the ring buffer is full, the oldest envelopes are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an envelope to all local subscribers.
    ///
    /// Returns the number of receivers that received it. With no active
    /// receivers the envelope is silently dropped.
    pub fn publish(&self, envelope: Envelope) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Creates a new receiver that will see all future envelopes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
