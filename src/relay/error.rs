use thiserror::Error;

use crate::crypto::SignerError;

/// Relay event and transport errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Event signing failed: {0}")]
    Signing(#[from] SignerError),
    #[error("Event serialization failed: {0}")]
    Serialization(String),
    #[error("Event id does not match its content")]
    IdMismatch,
    #[error("Invalid event signature")]
    InvalidSignature,
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(String),
    #[error("Connection timeout")]
    Timeout,
    #[error("WebSocket connection error: {0}")]
    Connect(String),
    #[error("Relay closed the connection before acknowledging")]
    Closed,
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::Serialization(error.to_string())
    }
}
