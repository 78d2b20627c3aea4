//! The hub's unit of transport.
//!
//! An [`Envelope`] wraps one [`HubEvent`] with its emission timestamp and
//! the patient it concerns. On the wire it is a single JSON text frame:
//!
//! ```json
//! {
//!   "type": "lab_result",
//!   "data": { "testName": "Troponin", "result": "0.8", "status": "critical" },
//!   "timestamp": "2024-01-01T00:00:00Z",
//!   "patientId": "p-17"
//! }
//! ```
//!
//! Decoding reads `type` first and then decodes `data` with the payload
//! type that kind requires.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::records::{AiInsight, Alert, LabResult, Patient, SystemStatus, VitalSigns};

/// Closed set of envelope kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A vital-signs reading was recorded.
    VitalsUpdate,
    /// A lab result was completed.
    LabResult,
    /// An alert was raised or acknowledged.
    Alert,
    /// An AI insight was produced.
    AiInsight,
    /// A patient was created, updated or discharged.
    PatientUpdate,
    /// Hub status report.
    SystemStatus,
}

impl EventKind {
    /// Every kind, in wire-declaration order.
    pub const ALL: [Self; 6] = [
        Self::VitalsUpdate,
        Self::LabResult,
        Self::Alert,
        Self::AiInsight,
        Self::SystemStatus,
        Self::PatientUpdate,
    ];

    /// Returns the wire name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VitalsUpdate => "vitals_update",
            Self::LabResult => "lab_result",
            Self::Alert => "alert",
            Self::AiInsight => "ai_insight",
            Self::PatientUpdate => "patient_update",
            Self::SystemStatus => "system_status",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of an envelope, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    /// Payload of `vitals_update`.
    VitalsUpdate(VitalSigns),
    /// Payload of `lab_result`.
    LabResult(LabResult),
    /// Payload of `alert`.
    Alert(Alert),
    /// Payload of `ai_insight`.
    AiInsight(AiInsight),
    /// Payload of `patient_update`.
    PatientUpdate(Patient),
    /// Payload of `system_status`.
    SystemStatus(SystemStatus),
}

impl HubEvent {
    /// Returns the discriminator for this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::VitalsUpdate(_) => EventKind::VitalsUpdate,
            Self::LabResult(_) => EventKind::LabResult,
            Self::Alert(_) => EventKind::Alert,
            Self::AiInsight(_) => EventKind::AiInsight,
            Self::PatientUpdate(_) => EventKind::PatientUpdate,
            Self::SystemStatus(_) => EventKind::SystemStatus,
        }
    }

    /// Returns the patient this payload concerns, if it carries one.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        let id = match self {
            Self::VitalsUpdate(v) => v.patient_id.as_str(),
            Self::LabResult(l) => l.patient_id.as_str(),
            Self::Alert(a) => a.patient_id.as_str(),
            Self::AiInsight(i) => i.patient_id.as_deref()?,
            Self::PatientUpdate(p) => p.id.as_str(),
            Self::SystemStatus(_) => return None,
        };
        (!id.is_empty()).then_some(id)
    }

    fn decode(kind: EventKind, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EventKind::VitalsUpdate => Self::VitalsUpdate(serde_json::from_value(data)?),
            EventKind::LabResult => Self::LabResult(serde_json::from_value(data)?),
            EventKind::Alert => Self::Alert(serde_json::from_value(data)?),
            EventKind::AiInsight => Self::AiInsight(serde_json::from_value(data)?),
            EventKind::PatientUpdate => Self::PatientUpdate(serde_json::from_value(data)?),
            EventKind::SystemStatus => Self::SystemStatus(serde_json::from_value(data)?),
        })
    }
}

/// Immutable, timestamped event as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireEnvelope")]
pub struct Envelope {
    event: HubEvent,
    timestamp: DateTime<Utc>,
    patient_id: Option<String>,
}

impl Envelope {
    /// Wraps `event`, stamping the current time and deriving the subject
    /// patient from the payload.
    #[must_use]
    pub fn new(event: HubEvent) -> Self {
        Self::at(event, Utc::now())
    }

    /// Wraps `event` with an explicit emission time.
    #[must_use]
    pub fn at(event: HubEvent, timestamp: DateTime<Utc>) -> Self {
        let patient_id = event.subject_id().map(str::to_owned);
        Self {
            event,
            timestamp,
            patient_id,
        }
    }

    /// Returns the typed payload.
    #[must_use]
    pub const fn event(&self) -> &HubEvent {
        &self.event
    }

    /// Returns the envelope kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Returns the emission time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the patient this envelope concerns, if any.
    #[must_use]
    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    /// Encodes the envelope as one JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a payload value cannot be
    /// represented in JSON (e.g. a non-finite float).
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Envelope", 4)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("data", &Payload(&self.event))?;
        state.serialize_field("timestamp", &self.timestamp)?;
        match &self.patient_id {
            Some(id) => state.serialize_field("patientId", id)?,
            None => state.skip_field("patientId")?,
        }
        state.end()
    }
}

/// Serializes only the inner record of a [`HubEvent`].
struct Payload<'a>(&'a HubEvent);

impl Serialize for Payload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            HubEvent::VitalsUpdate(v) => v.serialize(serializer),
            HubEvent::LabResult(l) => l.serialize(serializer),
            HubEvent::Alert(a) => a.serialize(serializer),
            HubEvent::AiInsight(i) => i.serialize(serializer),
            HubEvent::PatientUpdate(p) => p.serialize(serializer),
            HubEvent::SystemStatus(s) => s.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: EventKind,
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    patient_id: Option<String>,
}

impl TryFrom<WireEnvelope> for Envelope {
    type Error = serde_json::Error;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let event = HubEvent::decode(wire.kind, wire.data)?;
        Ok(Self {
            event,
            timestamp: wire.timestamp,
            patient_id: wire.patient_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::records::{LabStatus, PatientStatus};

    fn patient() -> Patient {
        Patient {
            id: "p-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            date_of_birth: None,
            gender: "female".to_string(),
            room: Some("4B".to_string()),
            admission_date: None,
            status: PatientStatus::Active,
            medical_record_number: "MRN-001".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn wire_names_match_kinds() {
        for kind in EventKind::ALL {
            let json = serde_json::to_string(&kind).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn patient_update_carries_subject_id() {
        let envelope = Envelope::new(HubEvent::PatientUpdate(patient()));
        assert_eq!(envelope.kind(), EventKind::PatientUpdate);
        assert_eq!(envelope.patient_id(), Some("p-1"));

        let Ok(frame) = envelope.to_frame() else {
            panic!("encode failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&frame) else {
            panic!("frame is not JSON");
        };
        assert_eq!(value.get("type").and_then(|v| v.as_str()), Some("patient_update"));
        assert_eq!(value.get("patientId").and_then(|v| v.as_str()), Some("p-1"));
        assert_eq!(
            value.pointer("/data/medicalRecordNumber").and_then(|v| v.as_str()),
            Some("MRN-001")
        );
        assert!(value.get("timestamp").is_some_and(|v| v.is_string()));
    }

    #[test]
    fn system_status_omits_patient_id() {
        let envelope = Envelope::new(HubEvent::SystemStatus(SystemStatus::connected()));
        assert_eq!(envelope.patient_id(), None);
        let frame = envelope.to_frame().unwrap_or_default();
        assert!(!frame.contains("patientId"));
        assert!(frame.contains("Real-time connection established"));
    }

    #[test]
    fn empty_patient_id_is_not_a_subject() {
        let json = r#"{"status":"critical","testName":"Troponin","result":"0.8"}"#;
        let Ok(lab) = serde_json::from_str::<LabResult>(json) else {
            panic!("lab should decode");
        };
        assert_eq!(Envelope::new(HubEvent::LabResult(lab)).patient_id(), None);
    }

    #[test]
    fn decodes_lab_result_frame() {
        let frame = r#"{"type":"lab_result","data":{"status":"critical","testName":"Troponin","result":"0.8"},"timestamp":"2024-01-01T00:00:00Z"}"#;
        let Ok(envelope) = serde_json::from_str::<Envelope>(frame) else {
            panic!("frame should decode");
        };
        let HubEvent::LabResult(lab) = envelope.event() else {
            panic!("expected lab result");
        };
        assert_eq!(lab.status, LabStatus::Critical);
        assert_eq!(envelope.timestamp().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_unknown_kind() {
        let frame = r#"{"type":"heartbeat","data":{},"timestamp":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Envelope>(frame).is_err());
    }

    #[test]
    fn rejects_payload_of_wrong_shape() {
        let frame = r#"{"type":"alert","data":{"title":"no severity"},"timestamp":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Envelope>(frame).is_err());
    }

    #[test]
    fn decode_preserves_wire_patient_id() {
        let Ok(envelope) = Envelope::new(HubEvent::PatientUpdate(patient()))
            .to_frame()
            .and_then(|f| serde_json::from_str::<Envelope>(&f))
        else {
            panic!("re-decode failed");
        };
        assert_eq!(envelope.patient_id(), Some("p-1"));
    }
}
