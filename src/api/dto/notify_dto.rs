//! DTOs for the ingress endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventKind;

/// Response body for every `POST /api/v1/notify/...` endpoint
/// (202 Accepted).
///
/// `recipients` is informational: the broadcast is best-effort and a
/// count of zero is still a success.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotifyResponse {
    /// Wire name of the envelope kind that was broadcast.
    pub kind: String,
    /// Number of connections the envelope was queued for.
    pub recipients: usize,
}

impl NotifyResponse {
    /// Builds a response for `kind`.
    #[must_use]
    pub fn new(kind: EventKind, recipients: usize) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            recipients,
        }
    }
}
