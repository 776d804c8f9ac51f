//! Mail error types.

use thiserror::Error;

/// Result type for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Mail errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// Missing or blank configuration, surfaced before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with something other than HTTP 200.
    #[error("Unable to send an email: {message} (code {status}).")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Provider error message, or the raw response body.
        message: String,
    },

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Missing required field.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network error.
    #[error("Network error: {0}")]
    Network(String),

    /// Anything else that went wrong while preparing or submitting a send.
    #[error("{0}")]
    Unexpected(String),
}

/// Coarse classification of a send failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendErrorKind {
    /// Credentials or required settings are missing.
    Configuration,
    /// The provider rejected the request.
    Transport,
    /// Serialization, network or any other failure.
    Unexpected,
}

impl MailError {
    /// Classify this error.
    pub fn kind(&self) -> SendErrorKind {
        match self {
            Self::Config(_) => SendErrorKind::Configuration,
            Self::Transport { .. } => SendErrorKind::Transport,
            _ => SendErrorKind::Unexpected,
        }
    }

    /// HTTP status code returned by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// A failed send, together with the recipients that did not get the message.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SendFailure {
    /// What went wrong.
    #[source]
    pub error: MailError,
    /// Every to, cc and bcc address of the message, once a send was attempted.
    pub failed_recipients: Vec<String>,
}

impl SendFailure {
    /// A failure that happened before any recipient was attempted.
    pub fn before_send(error: MailError) -> Self {
        Self {
            error,
            failed_recipients: Vec::new(),
        }
    }

    /// Classify the underlying error.
    pub fn kind(&self) -> SendErrorKind {
        self.error.kind()
    }
}
