//! Client subscriber errors.
//!
//! None of these ever escape the supervising task: decode errors are
//! logged and the frame dropped, transport and handshake errors feed the
//! state machine.

use tokio_tungstenite::tungstenite;

/// Failure observed by the client subscriber.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An inbound frame was not a well-formed envelope.
    #[error("malformed envelope: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured hub URL cannot be dialed.
    #[error("invalid hub URL: {0}")]
    InvalidUrl(String),

    /// The WebSocket handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    /// An established channel failed.
    #[error("transport error: {0}")]
    Transport(#[source] tungstenite::Error),
}

impl ClientError {
    /// Classifies a failed dial.
    pub(crate) fn dial(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Url(e) => Self::InvalidUrl(e.to_string()),
            other => Self::Handshake(other),
        }
    }
}
