//! WebSocket layer: connection registry, broadcast routing, socket tasks.
//!
//! The WebSocket endpoint (default `/ws`) is push-only: every accepted
//! connection receives every envelope the hub broadcasts, one JSON text
//! frame per envelope.

pub mod connection;
pub mod handler;
pub mod registry;
pub mod router;

pub use registry::{ConnectionHandle, ConnectionRegistry, DeliveryFailure, Frame};
pub use router::BroadcastRouter;
