//! Reconnecting client subscriber.
//!
//! [`Subscriber::spawn`] starts one supervising task that owns the socket
//! for the subscriber's whole life. The task dials the hub, pumps inbound
//! frames through [`dispatch_frame`] while connected, and on any drop or
//! failed handshake waits the delay chosen by the [`StateMachine`] and
//! dials again, indefinitely, until shut down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::dispatch::{Notification, Notifier, dispatch_frame};
use super::state::{ConnectionState, LinkEvent, ReconnectPolicy, StateMachine};
use super::ClientError;
use crate::config::SubscriberConfig;
use crate::domain::{Envelope, EventBus};

type HubStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the upstream message queue.
const UPSTREAM_CAPACITY: usize = 32;

/// Entry point for starting a subscriber.
#[derive(Debug, Clone, Copy)]
pub struct Subscriber;

impl Subscriber {
    /// Spawns the supervising task on the current Tokio runtime.
    ///
    /// The task starts dialing `config.hub_url` immediately.
    #[must_use]
    pub fn spawn(config: &SubscriberConfig, notifier: Arc<dyn Notifier>) -> SubscriberHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (last_tx, last_rx) = watch::channel(None);
        let (upstream_tx, upstream_rx) = mpsc::channel(UPSTREAM_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bus = EventBus::new(config.local_bus_capacity);
        let attempts = Arc::new(AtomicU64::new(0));

        let supervisor = Supervisor {
            url: config.hub_url.clone(),
            machine: StateMachine::new(ReconnectPolicy::from(config)),
            bus: bus.clone(),
            notifier,
            state_tx,
            last_tx,
            attempts: Arc::clone(&attempts),
            upstream_rx,
            shutdown_rx,
        };
        let task = tokio::spawn(supervisor.run());

        SubscriberHandle {
            state_rx,
            last_rx,
            upstream_tx,
            shutdown_tx,
            bus,
            attempts,
            task,
        }
    }
}

/// Handle to a running subscriber.
///
/// Dropping the handle stops the subscriber as well.
#[derive(Debug)]
pub struct SubscriberHandle {
    state_rx: watch::Receiver<ConnectionState>,
    last_rx: watch::Receiver<Option<Envelope>>,
    upstream_tx: mpsc::Sender<serde_json::Value>,
    shutdown_tx: watch::Sender<bool>,
    bus: EventBus,
    attempts: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl SubscriberHandle {
    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Returns a receiver that observes state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Subscribes to every envelope received from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe()
    }

    /// Returns the most recently received envelope.
    #[must_use]
    pub fn last_envelope(&self) -> Option<Envelope> {
        self.last_rx.borrow().clone()
    }

    /// Returns how many handshakes have been attempted so far.
    #[must_use]
    pub fn handshake_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Sends `message` upstream.
    ///
    /// Only possible while connected; otherwise the message is dropped and
    /// `false` is returned. The hub does not act on upstream messages.
    pub fn send(&self, message: serde_json::Value) -> bool {
        self.state().is_connected() && self.upstream_tx.try_send(message).is_ok()
    }

    /// Stops the subscriber, closing the socket if one is open, and waits
    /// for the supervising task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "subscriber task ended abnormally");
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Closed,
    Shutdown,
}

struct Supervisor {
    url: String,
    machine: StateMachine,
    bus: EventBus,
    notifier: Arc<dyn Notifier>,
    state_tx: watch::Sender<ConnectionState>,
    last_tx: watch::Sender<Option<Envelope>>,
    attempts: Arc<AtomicU64>,
    upstream_rx: mpsc::Receiver<serde_json::Value>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
    async fn run(mut self) {
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let _ = self.step(LinkEvent::Dial);
            let _ = self.attempts.fetch_add(1, Ordering::SeqCst);

            let dialed = tokio::select! {
                res = connect_async(self.url.as_str()) => res,
                _ = self.shutdown_rx.changed() => break,
            };

            let retry_after = match dialed {
                Err(e) => {
                    let err = ClientError::dial(e);
                    tracing::warn!(url = %self.url, error = %err, "hub unreachable");
                    self.step(LinkEvent::HandshakeFailed)
                }
                Ok((stream, _)) => {
                    let _ = self.step(LinkEvent::HandshakeSucceeded);
                    self.notifier.notify(Notification::connected());
                    if self.run_session(stream).await == SessionEnd::Shutdown {
                        break;
                    }
                    self.step(LinkEvent::ChannelClosed)
                }
            };

            let Some(delay) = retry_after else {
                continue;
            };
            tracing::debug!(delay_ms = delay.as_millis(), "reconnect scheduled");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = self.shutdown_rx.changed() => break,
            }
        }

        let _ = self.state_tx.send_replace(ConnectionState::Disconnected);
        tracing::debug!("subscriber stopped");
    }

    fn step(&mut self, event: LinkEvent) -> Option<std::time::Duration> {
        let transition = self.machine.apply(event);
        if transition.changed() {
            tracing::debug!(from = %transition.from, to = %transition.to, "subscriber state");
            let _ = self.state_tx.send_replace(transition.to);
        }
        transition.retry_after
    }

    async fn run_session(&mut self, stream: HubStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        // Messages queued while disconnected are not delivered.
        while self.upstream_rx.try_recv().is_ok() {}

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match dispatch_frame(text.as_str(), &self.bus, self.notifier.as_ref()) {
                                Ok(envelope) => {
                                    let _ = self.last_tx.send_replace(Some(envelope));
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "dropping inbound frame");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                        Some(Err(e)) => {
                            let err = ClientError::Transport(e);
                            tracing::warn!(error = %err, "hub connection lost");
                            return SessionEnd::Closed;
                        }
                        Some(Ok(_)) => {}
                    }
                }
                Some(message) = self.upstream_rx.recv() => {
                    match serde_json::to_string(&message) {
                        Ok(json) => {
                            if write.send(Message::text(json)).await.is_err() {
                                return SessionEnd::Closed;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to encode upstream message"),
                    }
                }
                _ = self.shutdown_rx.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            }
        }
    }
}
