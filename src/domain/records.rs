//! Typed mirrors of the dashboard's persisted records.
//!
//! The hub never stores these; it receives them from the CRUD layer right
//! after a successful write and passes them through to subscribers. Field
//! names follow the dashboard's camelCase JSON. Text identity columns
//! default to empty so that partial payloads still decode on the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Severity shared by alerts and AI insight priorities.
///
/// Ordered from least to most urgent, so `Severity::Critical` compares
/// greater than every other level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    Low,
    /// Needs attention during the current shift.
    #[default]
    Medium,
    /// Needs prompt attention.
    High,
    /// Needs immediate attention.
    Critical,
}

/// Outcome classification of a lab result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LabStatus {
    /// Within reference range.
    Normal,
    /// Above reference range.
    Elevated,
    /// Below reference range.
    Low,
    /// Outside the critical limits.
    Critical,
}

/// Source category of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Raised from a vital-signs reading.
    Vital,
    /// Raised from a lab result.
    Lab,
    /// Medication-related.
    Medication,
    /// Raised by the system itself.
    System,
}

/// Kind of generated AI insight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Forward-looking risk prediction.
    Prediction,
    /// Suggested clinical action.
    Recommendation,
    /// Retrospective analysis.
    #[default]
    Analysis,
}

/// Admission status of a patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    /// Currently admitted.
    #[default]
    Active,
    /// Discharged (soft delete).
    Discharged,
    /// Transferred to another facility.
    Transferred,
}

/// One vital-signs reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    /// Row identifier.
    #[serde(default)]
    pub id: String,
    /// Patient the reading belongs to.
    #[serde(default)]
    pub patient_id: String,
    /// Beats per minute.
    #[serde(default)]
    pub heart_rate: Option<u32>,
    /// Systolic blood pressure in mmHg.
    #[serde(default, rename = "systolicBP")]
    pub systolic_bp: Option<u32>,
    /// Diastolic blood pressure in mmHg.
    #[serde(default, rename = "diastolicBP")]
    pub diastolic_bp: Option<u32>,
    /// Body temperature in Fahrenheit.
    #[serde(default, deserialize_with = "decimal::optional")]
    pub temperature: Option<f64>,
    /// Breaths per minute.
    #[serde(default)]
    pub respiratory_rate: Option<u32>,
    /// SpO2 percentage.
    #[serde(default)]
    pub oxygen_saturation: Option<u32>,
    /// When the reading was taken.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Clinician who recorded it.
    #[serde(default)]
    pub recorded_by: Option<String>,
}

/// One completed lab test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    /// Row identifier.
    #[serde(default)]
    pub id: String,
    /// Patient the result belongs to.
    #[serde(default)]
    pub patient_id: String,
    /// Test name, e.g. `"Troponin"`.
    pub test_name: String,
    /// Result value as reported by the lab.
    pub result: String,
    /// Unit of the result value.
    #[serde(default)]
    pub unit: Option<String>,
    /// Reference range as free text.
    #[serde(default)]
    pub reference_range: Option<String>,
    /// Classification against the reference range.
    pub status: LabStatus,
    /// Ordering clinician.
    #[serde(default)]
    pub ordered_by: Option<String>,
    /// Completion time.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Reviewing clinician.
    #[serde(default)]
    pub reviewed_by: Option<String>,
    /// Review time.
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// A clinical alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Row identifier.
    #[serde(default)]
    pub id: String,
    /// Patient the alert concerns.
    #[serde(default)]
    pub patient_id: String,
    /// Source category.
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Urgency.
    pub severity: Severity,
    /// Short headline.
    pub title: String,
    /// Details.
    #[serde(default)]
    pub description: String,
    /// `false` once resolved.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Clinician who acknowledged it.
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    /// Acknowledgment time.
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A generated AI insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    /// Row identifier, absent before the insight is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Patient the insight concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// Insight kind.
    #[serde(rename = "type", default)]
    pub kind: InsightKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Model confidence, clamped to `0.0..=1.0`.
    #[serde(
        default = "decimal::default_confidence",
        deserialize_with = "decimal::unit_interval"
    )]
    pub confidence: f64,
    /// Urgency assigned by the generator.
    #[serde(default)]
    pub priority: Severity,
    /// Additional structured output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Time after which the insight is stale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A patient record after create, update or discharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Row identifier.
    #[serde(default)]
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Date of birth.
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
    /// Gender as recorded at admission.
    #[serde(default)]
    pub gender: String,
    /// Room assignment.
    #[serde(default)]
    pub room: Option<String>,
    /// Admission time.
    #[serde(default)]
    pub admission_date: Option<DateTime<Utc>>,
    /// Admission status.
    #[serde(default)]
    pub status: PatientStatus,
    /// Medical record number, unique per patient.
    #[serde(default)]
    pub medical_record_number: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Free-form hub status payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    /// Short status word, e.g. `"connected"` or `"active"`.
    pub status: String,
    /// Human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Open subscriber connections at the time of the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_connections: Option<usize>,
    /// Seconds since the hub was initialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
}

impl SystemStatus {
    /// Greeting sent to every connection right after it is accepted.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            status: "connected".to_string(),
            message: Some("Real-time connection established".to_string()),
            active_connections: None,
            uptime_secs: None,
        }
    }
}

/// Decimal columns arrive either as JSON numbers or numeric strings.
mod decimal {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    fn parse<E: serde::de::Error>(value: NumberOrText) -> Result<f64, E> {
        match value {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }

    pub(super) fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Option::<NumberOrText>::deserialize(d)?
            .map(parse)
            .transpose()
    }

    pub(super) fn unit_interval<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = Option::<NumberOrText>::deserialize(d)?
            .map(parse)
            .transpose()?
            .unwrap_or_else(default_confidence);
        Ok(value.clamp(0.0, 1.0))
    }

    pub(super) fn default_confidence() -> f64 {
        0.5
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn vitals_accepts_decimal_string_temperature() {
        let json = r#"{"id":"v1","patientId":"p1","heartRate":88,"systolicBP":120,
            "diastolicBP":80,"temperature":"98.6","timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let Ok(vitals) = serde_json::from_str::<VitalSigns>(json) else {
            panic!("vitals should decode");
        };
        assert_eq!(vitals.temperature, Some(98.6));
        assert_eq!(vitals.systolic_bp, Some(120));
        assert_eq!(vitals.respiratory_rate, None);
    }

    #[test]
    fn vitals_serializes_blood_pressure_wire_names() {
        let vitals = VitalSigns {
            id: "v1".to_string(),
            patient_id: "p1".to_string(),
            heart_rate: None,
            systolic_bp: Some(118),
            diastolic_bp: Some(76),
            temperature: None,
            respiratory_rate: None,
            oxygen_saturation: None,
            timestamp: None,
            recorded_by: None,
        };
        let json = serde_json::to_string(&vitals).unwrap_or_default();
        assert!(json.contains("\"systolicBP\":118"));
        assert!(json.contains("\"diastolicBP\":76"));
        assert!(json.contains("\"patientId\":\"p1\""));
    }

    #[test]
    fn partial_lab_result_decodes() {
        let json = r#"{"status":"critical","testName":"Troponin","result":"0.8"}"#;
        let Ok(lab) = serde_json::from_str::<LabResult>(json) else {
            panic!("partial lab result should decode");
        };
        assert_eq!(lab.status, LabStatus::Critical);
        assert_eq!(lab.test_name, "Troponin");
        assert!(lab.patient_id.is_empty());
    }

    #[test]
    fn insight_confidence_is_clamped() {
        let json = r#"{"title":"Sepsis risk","confidence":"1.7","priority":"critical"}"#;
        let Ok(insight) = serde_json::from_str::<AiInsight>(json) else {
            panic!("insight should decode");
        };
        assert!((insight.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(insight.priority, Severity::Critical);
        assert_eq!(insight.kind, InsightKind::Analysis);
    }

    #[test]
    fn insight_defaults_confidence_and_priority() {
        let json = r#"{"type":"prediction","title":"Stable"}"#;
        let Ok(insight) = serde_json::from_str::<AiInsight>(json) else {
            panic!("insight should decode");
        };
        assert!((insight.confidence - 0.5).abs() < f64::EPSILON);
        assert_eq!(insight.priority, Severity::Medium);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let json = r#"{"type":"vital","severity":"apocalyptic","title":"x"}"#;
        assert!(serde_json::from_str::<Alert>(json).is_err());
    }
}
