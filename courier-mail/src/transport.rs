//! Email transport trait.

use async_trait::async_trait;

use crate::{OutboundMessage, SendFailure};

/// Successful outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendReport {
    /// Batch recipient count, `None` when recipient counting is disabled.
    pub recipient_count: Option<usize>,
    /// A listener cancelled the send before anything went out.
    pub cancelled: bool,
}

impl SendReport {
    /// A completed send.
    pub fn sent(recipient_count: Option<usize>) -> Self {
        Self {
            recipient_count,
            cancelled: false,
        }
    }

    /// A send cancelled by a listener.
    pub fn cancelled() -> Self {
        Self {
            recipient_count: Some(0),
            cancelled: true,
        }
    }
}

/// Result of a single send.
pub type SendResult = std::result::Result<SendReport, SendFailure>;

/// Email transport trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message.
    ///
    /// On failure the message gets a fresh ID, so a retry is a new message.
    async fn send(&self, message: &mut OutboundMessage) -> SendResult;

    /// Check if the transport is healthy.
    async fn is_healthy(&self) -> bool {
        true
    }
}
