//! Shared helpers for integration tests.
#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use ward_hub::api;
use ward_hub::app_state::AppState;
use ward_hub::client::{Notification, Notifier};
use ward_hub::config::HubConfig;
use ward_hub::service::RealtimeHub;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const WAIT: Duration = Duration::from_secs(3);

/// Serves a fresh hub on an ephemeral port.
pub async fn start_hub() -> (SocketAddr, RealtimeHub) {
    let hub = RealtimeHub::initialize(&HubConfig::default());
    let app = api::build_app(AppState { hub: hub.clone() }, "/ws");

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hub)
}

/// Opens a raw WebSocket to the hub and consumes the greeting.
pub async fn connect(addr: SocketAddr) -> WsClient {
    let Ok((mut ws, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws connect failed");
    };
    let greeting = next_text(&mut ws).await;
    assert!(greeting.contains("\"type\":\"system_status\""));
    ws
}

/// Returns the next text frame, skipping control frames.
pub async fn next_text(ws: &mut WsClient) -> String {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(WAIT, ws.next()).await else {
            panic!("no frame received");
        };
        if let Message::Text(text) = msg {
            return text.as_str().to_owned();
        }
    }
}

/// Returns `true` if no text frame arrives within `window`.
pub async fn stays_silent(ws: &mut WsClient, window: Duration) -> bool {
    loop {
        match tokio::time::timeout(window, ws.next()).await {
            Err(_) => return true,
            Ok(Some(Ok(Message::Text(_)))) => return false,
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(_)) | None) => return true,
        }
    }
}

/// Polls `check` until it holds or the wait budget is spent.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Notifier that remembers what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn titles(&self) -> Vec<String> {
        self.seen
            .lock()
            .map(|v| v.iter().map(|n| n.title.clone()).collect())
            .unwrap_or_default()
    }

    pub fn seen(&self) -> Vec<Notification> {
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
