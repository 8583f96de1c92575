//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming chat payload.
///
/// Every field is optional: a missing `text` is treated as the empty string
/// rather than rejected, and `context` is extra client state the model may
/// use for grounding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageRequest {
    /// Free-form user text
    #[serde(default)]
    pub text: Option<String>,

    /// Optional client context payload
    #[serde(default)]
    pub context: Option<Value>,
}

/// Chat reply payload.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Always "ok" on the documented paths
    pub status: &'static str,

    /// The user text as received
    pub echo: String,

    /// The model's reply
    pub reply: String,

    /// Session the exchange was recorded under
    pub session_id: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
