//! Error types for the wallet-link client library.

use thiserror::Error;

/// Fallback message used when the backend rejects a request without a
/// `message` field in its error envelope.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// Errors raised by wallet-link operations.
#[derive(Debug, Error)]
pub enum WalletLinkError {
    /// The backend answered with a non-2xx status. `message` is the backend's
    /// own message, surfaced verbatim so it can be shown to the user.
    #[error("{message}")]
    ApiError { status: u16, message: String },

    /// A 2xx envelope that should have carried `data` did not.
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Transport-level failure (DNS, connection refused, TLS, ...).
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Reading or writing the durable session mirror failed.
    #[error("Session persistence error: {0}")]
    PersistenceError(String),

    /// An operation needing a bearer token ran without a session.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl WalletLinkError {
    /// `true` when the backend itself rejected the request (as opposed to the
    /// request never reaching it).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ApiError { .. } | Self::EmptyResponse(_))
    }

    /// HTTP status of a backend rejection, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WalletLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(err.to_string())
        } else if err.is_decode() {
            Self::SerializationError(err.to_string())
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WalletLinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for WalletLinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocketError(err.to_string())
    }
}

impl From<url::ParseError> for WalletLinkError {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigurationError(format!("Invalid URL: {}", err))
    }
}

/// Result alias for wallet-link operations.
pub type Result<T> = std::result::Result<T, WalletLinkError>;
