//! Decoding of inbound frames and per-kind side effects.

use std::fmt;

use super::ClientError;
use crate::domain::{Envelope, EventBus, HubEvent, LabStatus, Severity};

/// A user-facing notification (a toast, in the dashboard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Rendered as an error-styled notification.
    pub destructive: bool,
}

impl Notification {
    /// Shown once each time the subscriber reaches the connected state.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            title: "Real-time Connection".to_string(),
            description: "Successfully connected to live data feed".to_string(),
            destructive: false,
        }
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync + fmt::Debug {
    /// Presents `notification` to the user.
    fn notify(&self, notification: Notification);
}

/// [`Notifier`] that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        if notification.destructive {
            tracing::warn!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            );
        } else {
            tracing::info!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            );
        }
    }
}

/// Decodes one text frame into an [`Envelope`].
///
/// # Errors
///
/// Returns [`ClientError::Decode`] if the frame is not JSON, has an unknown
/// `type`, or its `data` does not fit that type.
pub fn decode_frame(text: &str) -> Result<Envelope, ClientError> {
    Ok(serde_json::from_str(text)?)
}

/// Returns the notification `envelope` should raise, if any.
///
/// Only critical alerts, critical lab results and critical-priority AI
/// insights notify; every other envelope is republished silently.
#[must_use]
pub fn side_effect(envelope: &Envelope) -> Option<Notification> {
    match envelope.event() {
        HubEvent::Alert(alert) if alert.severity == Severity::Critical => Some(Notification {
            title: "Critical Alert".to_string(),
            description: alert.title.clone(),
            destructive: true,
        }),
        HubEvent::LabResult(lab) if lab.status == LabStatus::Critical => Some(Notification {
            title: "Critical Lab Result".to_string(),
            description: format!("{}: {}", lab.test_name, lab.result),
            destructive: true,
        }),
        HubEvent::AiInsight(insight) if insight.priority == Severity::Critical => {
            Some(Notification {
                title: "AI Alert".to_string(),
                description: insight.title.clone(),
                destructive: false,
            })
        }
        HubEvent::Alert(_)
        | HubEvent::LabResult(_)
        | HubEvent::AiInsight(_)
        | HubEvent::VitalsUpdate(_)
        | HubEvent::PatientUpdate(_)
        | HubEvent::SystemStatus(_) => None,
    }
}

/// Decodes `text`, republishes the envelope on `bus` and applies its side
/// effect exactly once.
///
/// Returns the decoded envelope.
///
/// # Errors
///
/// Returns [`ClientError::Decode`] for malformed frames; nothing is
/// published or notified in that case.
pub fn dispatch_frame(
    text: &str,
    bus: &EventBus,
    notifier: &dyn Notifier,
) -> Result<Envelope, ClientError> {
    let envelope = decode_frame(text)?;
    let listeners = bus.publish(envelope.clone());
    tracing::debug!(kind = %envelope.kind(), listeners, "envelope republished");
    if let Some(notification) = side_effect(&envelope) {
        notifier.notify(notification);
    }
    Ok(envelope)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::EventKind;

    /// Notifier that remembers what it was asked to show.
    #[derive(Debug, Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn seen(&self) -> Vec<Notification> {
            self.seen.lock().map(|v| v.clone()).unwrap_or_default()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(notification);
            }
        }
    }

    const CRITICAL_LAB: &str = r#"{"type":"lab_result","data":{"status":"critical","testName":"Troponin","result":"0.8"},"timestamp":"2024-01-01T00:00:00Z"}"#;

    fn alert_frame(severity: &str) -> String {
        format!(
            r#"{{"type":"alert","data":{{"id":"a1","patientId":"p1","type":"vital","severity":"{severity}","title":"Heart rate 160","description":"Tachycardia"}},"timestamp":"2024-01-01T00:00:00Z","patientId":"p1"}}"#
        )
    }

    #[test]
    fn critical_alert_notifies_once() {
        let bus = EventBus::new(8);
        let notifier = RecordingNotifier::default();

        let result = dispatch_frame(&alert_frame("critical"), &bus, &notifier);
        assert!(result.is_ok());

        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        let Some(first) = seen.first() else {
            panic!("notification expected");
        };
        assert_eq!(first.title, "Critical Alert");
        assert_eq!(first.description, "Heart rate 160");
        assert!(first.destructive);
    }

    #[test]
    fn non_critical_alert_is_silent() {
        let bus = EventBus::new(8);
        let notifier = RecordingNotifier::default();
        assert!(dispatch_frame(&alert_frame("high"), &bus, &notifier).is_ok());
        assert!(notifier.seen().is_empty());
    }

    #[test]
    fn vitals_update_has_no_side_effect() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let notifier = RecordingNotifier::default();
        let frame = r#"{"type":"vitals_update","data":{"patientId":"p1","heartRate":72},"timestamp":"2024-01-01T00:00:00Z","patientId":"p1"}"#;

        let Ok(envelope) = dispatch_frame(frame, &bus, &notifier) else {
            panic!("vitals frame should dispatch");
        };
        assert_eq!(envelope.kind(), EventKind::VitalsUpdate);
        assert!(notifier.seen().is_empty());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn critical_lab_embeds_test_name_and_result() {
        let bus = EventBus::new(8);
        let notifier = RecordingNotifier::default();
        assert!(dispatch_frame(CRITICAL_LAB, &bus, &notifier).is_ok());

        let seen = notifier.seen();
        assert_eq!(seen.len(), 1);
        let Some(first) = seen.first() else {
            panic!("notification expected");
        };
        assert_eq!(first.title, "Critical Lab Result");
        assert!(first.description.contains("Troponin"));
        assert!(first.description.contains("0.8"));
    }

    #[test]
    fn critical_insight_raises_ai_alert() {
        let frame = r#"{"type":"ai_insight","data":{"type":"prediction","title":"Sepsis risk rising","content":"...","confidence":0.91,"priority":"critical","patientId":"p9"},"timestamp":"2024-01-01T00:00:00Z","patientId":"p9"}"#;
        let Ok(envelope) = decode_frame(frame) else {
            panic!("insight should decode");
        };
        let Some(notification) = side_effect(&envelope) else {
            panic!("critical insight should notify");
        };
        assert_eq!(notification.title, "AI Alert");
        assert_eq!(notification.description, "Sepsis risk rising");
    }

    #[test]
    fn malformed_frame_is_rejected_without_side_effects() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let notifier = RecordingNotifier::default();

        let result = dispatch_frame("{not json", &bus, &notifier);
        assert!(matches!(result, Err(ClientError::Decode(_))));
        assert!(rx.try_recv().is_err());
        assert!(notifier.seen().is_empty());
    }

    #[test]
    fn every_envelope_is_republished() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let notifier = RecordingNotifier::default();

        assert!(dispatch_frame(CRITICAL_LAB, &bus, &notifier).is_ok());
        assert!(dispatch_frame(&alert_frame("low"), &bus, &notifier).is_ok());

        let (Ok(first), Ok(second)) = (rx.try_recv(), rx.try_recv()) else {
            panic!("both envelopes should be on the bus");
        };
        assert_eq!(first.kind(), EventKind::LabResult);
        assert_eq!(second.kind(), EventKind::Alert);
    }
}
