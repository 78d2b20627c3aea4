//! Operator tool: subscribes to a running hub and logs every envelope.
//!
//! Uses the same reconnecting subscriber as dashboard clients, configured
//! from `HUB_URL`, `RECONNECT_DELAY_MS` and `HANDSHAKE_RETRY_DELAY_MS`.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use ward_hub::client::{Subscriber, TracingNotifier};
use ward_hub::config::SubscriberConfig;
use ward_hub::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SubscriberConfig::from_env();
    telemetry::init(config.log_format);
    tracing::info!(url = %config.hub_url, "tailing hub");

    let handle = Subscriber::spawn(&config, Arc::new(TracingNotifier));
    let mut envelopes = handle.subscribe();
    let mut states = handle.watch_state();

    loop {
        tokio::select! {
            received = envelopes.recv() => match received {
                Ok(envelope) => {
                    let frame = envelope.to_frame()?;
                    tracing::info!(
                        kind = %envelope.kind(),
                        patient_id = envelope.patient_id().unwrap_or("-"),
                        %frame,
                        "envelope"
                    );
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(lagged = n, "tail fell behind"),
                Err(RecvError::Closed) => break,
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                tracing::info!(%state, indicator = state.indicator(), "connection");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}
