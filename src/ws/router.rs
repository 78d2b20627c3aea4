//! Best-effort fan-out of envelopes to every registered connection.

use std::sync::Arc;

use super::registry::{ConnectionHandle, ConnectionRegistry, DeliveryFailure, Frame};
use crate::domain::Envelope;

/// Delivers envelopes to every connection in a [`ConnectionRegistry`].
///
/// # Delivery contract
///
/// Broadcasting is **at-most-once and best-effort**:
///
/// - the envelope is serialized once and every recipient receives the
///   byte-identical frame;
/// - each registered connection gets exactly one delivery attempt per call;
/// - a connection that is closed, or whose outbound queue is full, is
///   skipped and never retried; closed connections are pruned from the
///   registry after the pass;
/// - nothing is acknowledged, buffered for later or replayed. A client that
///   is offline when a broadcast happens misses it for good and must
///   refresh through the pull-based API.
///
/// None of these outcomes is an error for the caller, so the methods
/// return plain counts rather than `Result`.
#[derive(Debug, Clone)]
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastRouter {
    /// Creates a router over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this router fans out to.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Pushes `envelope` to every registered connection.
    ///
    /// Returns the number of connections whose queue accepted the frame.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        let Some(frame) = encode(envelope) else {
            return 0;
        };

        let targets = self.registry.snapshot().await;
        let mut delivered = 0usize;
        let mut closed = Vec::new();

        for conn in &targets {
            match conn.try_deliver(&frame) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(DeliveryFailure::Closed) => closed.push(conn.id()),
                Err(DeliveryFailure::QueueFull) => {
                    tracing::warn!(conn_id = %conn.id(), kind = %envelope.kind(), "outbound queue full, frame dropped");
                }
            }
        }

        for id in closed {
            let _ = self.registry.unregister(id).await;
        }

        tracing::debug!(
            kind = %envelope.kind(),
            targets = targets.len(),
            recipients = delivered,
            "broadcast envelope"
        );
        delivered
    }

    /// Pushes `envelope` to a single connection.
    ///
    /// Returns `true` if the frame was queued.
    pub fn send_to(&self, conn: &ConnectionHandle, envelope: &Envelope) -> bool {
        encode(envelope).is_some_and(|frame| conn.try_deliver(&frame).is_ok())
    }
}

fn encode(envelope: &Envelope) -> Option<Frame> {
    match envelope.to_frame() {
        Ok(json) => Some(Frame::from(json)),
        Err(e) => {
            tracing::warn!(kind = %envelope.kind(), error = %e, "failed to serialize envelope");
            None
        }
    }
}
