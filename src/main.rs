//! ward-hub server entry point.
//!
//! Starts the Axum HTTP server with the REST and WebSocket endpoints.

use ward_hub::api;
use ward_hub::app_state::AppState;
use ward_hub::config::HubConfig;
use ward_hub::service::RealtimeHub;
use ward_hub::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = HubConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    telemetry::init(config.log_format);
    tracing::info!(addr = %config.listen_addr, ws_path = %config.ws_path, "starting ward-hub");

    // Build the hub and application state
    let hub = RealtimeHub::initialize(&config);
    let app_state = AppState { hub: hub.clone() };

    // Build router
    let app = api::build_app(app_state, &config.ws_path);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C, then closes every subscriber connection so that
/// upgraded sockets do not outlive the server.
async fn shutdown_signal(hub: RealtimeHub) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
    let _ = hub.shutdown().await;
}
