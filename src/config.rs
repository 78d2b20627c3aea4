//! Hub and subscriber configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unparseable values fall back to the
//! defaults, except `LISTEN_ADDR` which must be a valid socket address.

use std::net::SocketAddr;
use std::time::Duration;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, single line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT` (`json` or anything else for text).
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Server-side hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Path of the WebSocket endpoint.
    pub ws_path: String,

    /// Capacity of each connection's outbound frame queue.
    pub outbound_queue_capacity: usize,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: "/ws".to_string(),
            outbound_queue_capacity: 256,
            log_format: LogFormat::Text,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let ws_path = std::env::var("WS_PATH")
            .ok()
            .filter(|p| p.starts_with('/'))
            .unwrap_or(defaults.ws_path);

        Ok(Self {
            listen_addr,
            ws_path,
            outbound_queue_capacity: parse_env(
                "OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            ),
            log_format: LogFormat::from_env(),
        })
    }
}

/// Client-side subscriber configuration.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// WebSocket URL of the hub, e.g. `ws://127.0.0.1:3000/ws`.
    pub hub_url: String,

    /// Delay before redialing after an established connection dropped.
    pub reconnect_delay: Duration,

    /// Delay before redialing after a handshake failed.
    pub handshake_retry_delay: Duration,

    /// Capacity of the local envelope bus.
    pub local_bus_capacity: usize,

    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            hub_url: "ws://127.0.0.1:3000/ws".to_string(),
            reconnect_delay: Duration::from_millis(3_000),
            handshake_retry_delay: Duration::from_millis(5_000),
            local_bus_capacity: 1_024,
            log_format: LogFormat::Text,
        }
    }
}

impl SubscriberConfig {
    /// Loads configuration from environment variables, falling back to
    /// [`SubscriberConfig::default`] for anything missing or invalid.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            hub_url: std::env::var("HUB_URL").unwrap_or(defaults.hub_url),
            reconnect_delay: Duration::from_millis(parse_env(
                "RECONNECT_DELAY_MS",
                duration_ms(defaults.reconnect_delay),
            )),
            handshake_retry_delay: Duration::from_millis(parse_env(
                "HANDSHAKE_RETRY_DELAY_MS",
                duration_ms(defaults.handshake_retry_delay),
            )),
            local_bus_capacity: parse_env("LOCAL_BUS_CAPACITY", defaults.local_bus_capacity),
            log_format: LogFormat::from_env(),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.ws_path, "/ws");
        assert_eq!(config.outbound_queue_capacity, 256);
    }

    #[test]
    fn subscriber_defaults_keep_two_fixed_delays() {
        let config = SubscriberConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.handshake_retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: usize = parse_env("WARD_HUB_SURELY_UNSET_KEY", 7);
        assert_eq!(value, 7);
    }
}
