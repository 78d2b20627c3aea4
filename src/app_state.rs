//! Shared application state injected into all Axum handlers.

use crate::service::RealtimeHub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Notification hub: connection registry and ingress hooks.
    pub hub: RealtimeHub,
}
