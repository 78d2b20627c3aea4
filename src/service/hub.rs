//! Realtime hub: connection lifecycle and the per-event ingress hooks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;

use crate::config::HubConfig;
use crate::domain::{
    AiInsight, Alert, ConnectionId, Envelope, HubEvent, LabResult, Patient, SystemStatus,
    VitalSigns,
};
use crate::ws::{BroadcastRouter, ConnectionHandle, ConnectionRegistry, Frame};

/// Explicitly constructed notification hub.
///
/// Cheap to clone; every clone shares the same registry. Route handlers
/// receive a handle through [`crate::app_state::AppState`] and call one of
/// the `notify_*` hooks right after their own write has succeeded.
///
/// The hooks are fire-and-forget: they return the number of connections
/// the envelope was queued for, and nothing they do can fail the caller's
/// request. See [`BroadcastRouter`] for the delivery contract.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    router: BroadcastRouter,
    outbound_queue_capacity: usize,
    started_at: Instant,
    shut_down: Arc<AtomicBool>,
}

impl RealtimeHub {
    /// Creates a hub with an empty registry.
    #[must_use]
    pub fn initialize(config: &HubConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        tracing::info!(
            ws_path = %config.ws_path,
            queue_capacity = config.outbound_queue_capacity,
            "realtime hub initialized"
        );
        Self {
            router: BroadcastRouter::new(registry),
            outbound_queue_capacity: config.outbound_queue_capacity,
            started_at: Instant::now(),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Closes every open connection and stops accepting new ones.
    ///
    /// Returns the number of connections that were closed. Hooks called
    /// afterwards still succeed and reach nobody.
    pub async fn shutdown(&self) -> usize {
        self.shut_down.store(true, Ordering::SeqCst);
        let closed = self.router.registry().clear().await;
        tracing::info!(closed, "realtime hub shut down");
        closed
    }

    /// Returns `true` once [`Self::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Registers a new connection with the `system_status` greeting already
    /// at the head of its queue.
    ///
    /// Returns the connection id and the receiving half of its outbound
    /// queue, or `None` if the hub has been shut down. The registry holds
    /// the only sender, so the queue closes once the connection is released
    /// or the hub shuts down.
    pub async fn accept(&self) -> Option<(ConnectionId, mpsc::Receiver<Frame>)> {
        if self.is_shut_down() {
            return None;
        }
        let (handle, rx) = ConnectionHandle::channel(self.outbound_queue_capacity);
        let id = handle.id();

        // Greeting goes in before the handle is visible to broadcasts.
        let greeting = Envelope::new(HubEvent::SystemStatus(SystemStatus::connected()));
        if !self.router.send_to(&handle, &greeting) {
            tracing::warn!(conn_id = %id, "failed to queue greeting");
        }
        self.router.registry().register(handle).await;

        // A shutdown that cleared the registry before we registered.
        if self.is_shut_down() {
            let _ = self.router.registry().unregister(id).await;
            return None;
        }
        tracing::info!(conn_id = %id, "subscriber connected");
        Some((id, rx))
    }

    /// Removes a connection after its socket closed or failed. Idempotent.
    pub async fn release(&self, id: ConnectionId) -> bool {
        let removed = self.router.registry().unregister(id).await;
        tracing::info!(conn_id = %id, "subscriber disconnected");
        removed
    }

    /// Hook for a newly recorded vital-signs reading.
    pub async fn notify_vitals(&self, record: VitalSigns) -> usize {
        self.publish(HubEvent::VitalsUpdate(record)).await
    }

    /// Hook for a completed lab result.
    pub async fn notify_lab_result(&self, record: LabResult) -> usize {
        self.publish(HubEvent::LabResult(record)).await
    }

    /// Hook for a raised or acknowledged alert.
    pub async fn notify_alert(&self, record: Alert) -> usize {
        self.publish(HubEvent::Alert(record)).await
    }

    /// Hook for a generated AI insight.
    pub async fn notify_insight(&self, record: AiInsight) -> usize {
        self.publish(HubEvent::AiInsight(record)).await
    }

    /// Hook for a created, updated or discharged patient.
    pub async fn notify_patient_change(&self, record: Patient) -> usize {
        self.publish(HubEvent::PatientUpdate(record)).await
    }

    /// Broadcasts a status report on demand.
    pub async fn notify_system_status(&self, status: SystemStatus) -> usize {
        self.publish(HubEvent::SystemStatus(status)).await
    }

    /// Returns the number of open subscriber connections.
    pub async fn connection_count(&self) -> usize {
        self.router.registry().size().await
    }

    /// Builds the current status report.
    pub async fn system_status(&self) -> SystemStatus {
        let status = if self.is_shut_down() { "stopped" } else { "active" };
        SystemStatus {
            status: status.to_string(),
            message: None,
            active_connections: Some(self.connection_count().await),
            uptime_secs: Some(self.started_at.elapsed().as_secs()),
        }
    }

    async fn publish(&self, event: HubEvent) -> usize {
        let envelope = Envelope::new(event);
        self.router.broadcast(&envelope).await
    }
}
