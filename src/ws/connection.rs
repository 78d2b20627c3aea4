//! Per-connection socket task.
//!
//! Owns one upgraded WebSocket for its whole life: registers it with the
//! hub, drains the outbound queue into the socket and watches the inbound
//! half for close. Whatever ends the loop, the connection is released.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::domain::ConnectionId;
use crate::service::RealtimeHub;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Forwards queued frames from the hub to the client, in queue order.
/// - Ignores text sent upstream by the client; there is no upstream protocol.
/// - Ends on client close, stream end, read or write error, or when the
///   hub drops the queue (shutdown), then unregisters the connection.
pub async fn run_connection(socket: WebSocket, hub: RealtimeHub) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Some((conn_id, mut outbound)) = hub.accept().await else {
        tracing::debug!("hub is shut down, refusing connection");
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    };

    loop {
        tokio::select! {
            // Frame queued by the broadcast router
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = ws_tx.send(Message::text(frame.as_ref())).await {
                            tracing::debug!(conn_id = %conn_id, error = %e, "ws write failed");
                            break;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_upstream(conn_id, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn_id = %conn_id, error = %e, "ws read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = hub.release(conn_id).await;
}

fn handle_upstream(conn_id: ConnectionId, text: &str) {
    tracing::debug!(conn_id = %conn_id, bytes = text.len(), "ignoring upstream message");
}
