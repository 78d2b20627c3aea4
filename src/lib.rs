//! # ward-hub
//!
//! Real-time notification hub for a hospital dashboard.
//!
//! The hub accepts WebSocket subscribers, and whenever a collaborator
//! (the CRUD route layer) finishes a write it hands the fresh record to one
//! of the hub's ingress hooks. The hook wraps the record in a typed
//! [`domain::Envelope`] and fans it out to every open subscriber. The hub
//! is a liveness optimization, not a source of truth: delivery is
//! best-effort and at-most-once, and clients recover anything missed
//! through the pull-based API.
//!
//! ## Architecture
//!
//! ```text
//! Collaborators (CRUD routes, in-process or via POST /api/v1/notify/*)
//!     │
//!     ├── RealtimeHub ingress hooks (service/)
//!     │
//!     ├── BroadcastRouter ──▶ ConnectionRegistry (ws/)
//!     │
//!     ├── per-connection socket tasks (ws/)
//!     │
//!     ▼
//! Subscribers (client/): decode ──▶ local EventBus ──▶ widgets
//!                                 └▶ Notifier (critical events)
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod telemetry;
pub mod ws;
