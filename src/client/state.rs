//! Connection state machine of the client subscriber.
//!
//! Transitions are plain values so the supervising task only has to feed
//! [`LinkEvent`]s in and act on the [`Transition`] it gets back.
//!
//! ```text
//!            Dial                 HandshakeSucceeded
//! Disconnected ──▶ Connecting ─────────────────────▶ Connected
//!      ▲               │                                 │
//!      │  HandshakeFailed (retry after handshake delay)  │
//!      ├───────────────┘                                 │
//!      │          ChannelClosed (retry after drop delay) │
//!      └─────────────────────────────────────────────────┘
//! ```
//!
//! There is no backoff growth and no retry cap.

use std::fmt;
use std::time::Duration;

use crate::config::SubscriberConfig;

/// Where the subscriber's single logical connection currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No active channel. Initial state and the state after any failure.
    #[default]
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Handshake done; inbound envelopes are accepted.
    Connected,
}

impl ConnectionState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }

    /// Returns `true` in [`ConnectionState::Connected`].
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns the label a UI shows for this state.
    ///
    /// Anything other than connected reads as a transient
    /// `"Connecting…"`; hub failures never surface as errors.
    #[must_use]
    pub const fn indicator(&self) -> &'static str {
        match self {
            Self::Connected => "Live",
            Self::Connecting | Self::Disconnected => "Connecting…",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A dial attempt starts.
    Dial,
    /// The WebSocket handshake completed.
    HandshakeSucceeded,
    /// The WebSocket handshake failed.
    HandshakeFailed,
    /// An established channel closed or errored.
    ChannelClosed,
}

/// Fixed redial delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay after an established connection dropped.
    pub after_drop: Duration,
    /// Delay after a handshake failed. Longer, so an unreachable endpoint
    /// is not hammered.
    pub after_handshake_failure: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            after_drop: Duration::from_secs(3),
            after_handshake_failure: Duration::from_secs(5),
        }
    }
}

impl From<&SubscriberConfig> for ReconnectPolicy {
    fn from(config: &SubscriberConfig) -> Self {
        Self {
            after_drop: config.reconnect_delay,
            after_handshake_failure: config.handshake_retry_delay,
        }
    }
}

/// Result of applying one [`LinkEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the event.
    pub from: ConnectionState,
    /// State after the event.
    pub to: ConnectionState,
    /// When set, the supervisor must dial again after this delay.
    pub retry_after: Option<Duration>,
}

impl Transition {
    /// Returns `true` if the state actually changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// The subscriber's connection state machine.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: ConnectionState,
    policy: ReconnectPolicy,
}

impl StateMachine {
    /// Creates a machine in [`ConnectionState::Disconnected`].
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Applies `event`. Events that make no sense in the current state
    /// leave it unchanged and schedule nothing.
    pub fn apply(&mut self, event: LinkEvent) -> Transition {
        use ConnectionState::{Connected, Connecting, Disconnected};

        let from = self.state;
        let (to, retry_after) = match (from, event) {
            (Disconnected, LinkEvent::Dial) => (Connecting, None),
            (Connecting, LinkEvent::HandshakeSucceeded) => (Connected, None),
            (Connecting, LinkEvent::HandshakeFailed) => {
                (Disconnected, Some(self.policy.after_handshake_failure))
            }
            (Connected, LinkEvent::ChannelClosed) => (Disconnected, Some(self.policy.after_drop)),
            (state, _) => (state, None),
        };
        self.state = to;
        Transition {
            from,
            to,
            retry_after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            after_drop: Duration::from_millis(30),
            after_handshake_failure: Duration::from_millis(50),
        }
    }

    #[test]
    fn starts_disconnected() {
        let machine = StateMachine::new(policy());
        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(machine.state().indicator(), "Connecting…");
    }

    #[test]
    fn drop_goes_disconnected_then_connecting() {
        let mut machine = StateMachine::new(policy());
        let _ = machine.apply(LinkEvent::Dial);
        let _ = machine.apply(LinkEvent::HandshakeSucceeded);
        assert!(machine.state().is_connected());

        let dropped = machine.apply(LinkEvent::ChannelClosed);
        assert_eq!(dropped.from, ConnectionState::Connected);
        assert_eq!(dropped.to, ConnectionState::Disconnected);
        assert_eq!(dropped.retry_after, Some(Duration::from_millis(30)));

        let redial = machine.apply(LinkEvent::Dial);
        assert_eq!(redial.to, ConnectionState::Connecting);
    }

    #[test]
    fn handshake_failure_uses_longer_delay() {
        let mut machine = StateMachine::new(policy());
        let _ = machine.apply(LinkEvent::Dial);
        let failed = machine.apply(LinkEvent::HandshakeFailed);
        assert_eq!(failed.to, ConnectionState::Disconnected);
        assert_eq!(failed.retry_after, Some(Duration::from_millis(50)));
    }

    #[test]
    fn retries_are_unbounded_and_fixed() {
        let mut machine = StateMachine::new(policy());
        for _ in 0..1_000 {
            let _ = machine.apply(LinkEvent::Dial);
            let failed = machine.apply(LinkEvent::HandshakeFailed);
            assert_eq!(failed.retry_after, Some(Duration::from_millis(50)));
        }
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn nonsensical_events_are_ignored() {
        let mut machine = StateMachine::new(policy());
        let t = machine.apply(LinkEvent::ChannelClosed);
        assert!(!t.changed());
        assert_eq!(t.retry_after, None);

        let _ = machine.apply(LinkEvent::Dial);
        let t = machine.apply(LinkEvent::Dial);
        assert!(!t.changed());
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[test]
    fn default_policy_matches_dashboard_client() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.after_drop, Duration::from_secs(3));
        assert_eq!(policy.after_handshake_failure, Duration::from_secs(5));
    }
}
