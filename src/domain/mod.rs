//! Domain layer: records, envelopes, connection identity and the local bus.
//!
//! This module contains the types shared by the server side of the hub and
//! the client subscriber: the typed dashboard records, the [`Envelope`]
//! that carries them over the wire, and the in-process [`EventBus`] used to
//! republish received envelopes.

pub mod connection_id;
pub mod envelope;
pub mod event_bus;
pub mod records;

pub use connection_id::ConnectionId;
pub use envelope::{Envelope, EventKind, HubEvent};
pub use event_bus::EventBus;
pub use records::{
    AiInsight, Alert, AlertKind, InsightKind, LabResult, LabStatus, Patient, PatientStatus,
    Severity, SystemStatus, VitalSigns,
};
