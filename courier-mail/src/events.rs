//! Send lifecycle events.

use crate::OutboundMessage;

/// Result of an attempted send, as reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Success,
    Failed,
}

/// Emitted after every attempted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendEvent {
    pub status: SendStatus,
    /// Recipients that did not get the message.
    pub failed_recipients: Vec<String>,
    /// Message ID at the time of the attempt.
    pub message_id: Option<String>,
}

/// Observer of a transport's sends.
///
/// Both hooks have no-op defaults.
pub trait SendListener: Send + Sync {
    /// Called before anything is sent; return `false` to cancel the send.
    fn before_send(&self, _message: &OutboundMessage) -> bool {
        true
    }

    /// Called once the send succeeded or failed.
    fn send_performed(&self, _event: &SendEvent) {}
}
