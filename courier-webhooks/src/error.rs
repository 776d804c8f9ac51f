//! Error types for webhook operations

use thiserror::Error;

/// Errors that can occur while receiving provider callbacks
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Signature missing from request
    #[error("Signature missing from request")]
    SignatureMissing,

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The suppression-list collaborator rejected an update
    #[error("Suppression list error: {0}")]
    Suppression(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::PayloadError(err.to_string())
    }
}
