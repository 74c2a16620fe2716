use serde::{Deserialize, Serialize};

/// Standard response envelope returned by every backend endpoint.
///
/// Successful responses carry `data`; failures usually carry only `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Endpoint payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable status or error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// An envelope with neither data nor message (empty 2xx body).
    pub fn empty() -> Self {
        Self {
            data: None,
            message: None,
        }
    }
}

/// Error body shape; only `message` is read.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}
