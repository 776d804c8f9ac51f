//! Provider-imposed batch limits.

use crate::{MailgunConfig, OutboundMessage};

/// Recipient-count limits for batch sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchLimiter {
    max_batch_limit: u32,
    batch_recipient_count: Option<u32>,
}

impl BatchLimiter {
    /// Create a limiter.
    ///
    /// `max_batch_limit` of 0 means unlimited; a `batch_recipient_count`
    /// of `None` disables recipient counting altogether.
    pub fn new(max_batch_limit: u32, batch_recipient_count: Option<u32>) -> Self {
        Self {
            max_batch_limit,
            batch_recipient_count,
        }
    }

    /// Build a limiter from transport configuration.
    pub fn from_config(config: &MailgunConfig) -> Self {
        Self::new(config.max_batch_limit, config.batch_recipient_count)
    }

    /// Maximum number of "to" addresses per batch, 0 if unlimited.
    pub fn max_batch_limit(&self) -> u32 {
        self.max_batch_limit
    }

    /// The configured per-batch recipient cap.
    pub fn recipient_cap(&self) -> Option<u32> {
        self.batch_recipient_count
    }

    /// Recipients the batch would hold after adding `to_be_added` more.
    ///
    /// Returns `None` when no recipient cap is configured.
    pub fn batch_recipient_count(
        &self,
        message: &OutboundMessage,
        to_be_added: usize,
    ) -> Option<usize> {
        self.batch_recipient_count
            .map(|_| message.recipient_count().saturating_add(to_be_added))
    }

    /// Whether adding `to_be_added` recipients would exceed either limit.
    pub fn exceeds_limit(&self, message: &OutboundMessage, to_be_added: usize) -> bool {
        if self.max_batch_limit > 0 && message.to.len().saturating_add(to_be_added) > self.max_batch_limit as usize
        {
            return true;
        }

        match (self.batch_recipient_count, self.batch_recipient_count(message, to_be_added)) {
            (Some(cap), Some(count)) => cap > 0 && count > cap as usize,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutboundMessage {
        OutboundMessage::new()
            .to("a@example.com")
            .to("b@example.com")
            .cc("c@example.com")
    }

    #[test]
    fn test_count_with_cap() {
        let limiter = BatchLimiter::new(0, Some(5));
        assert_eq!(limiter.batch_recipient_count(&message(), 1), Some(4));
        assert_eq!(limiter.batch_recipient_count(&message(), 0), Some(3));
    }

    #[test]
    fn test_count_without_cap() {
        let limiter = BatchLimiter::new(1000, None);
        assert_eq!(limiter.batch_recipient_count(&message(), 1), None);
        assert_eq!(limiter.max_batch_limit(), 1000);
    }

    #[test]
    fn test_exceeds_recipient_cap() {
        let limiter = BatchLimiter::new(0, Some(4));
        assert!(!limiter.exceeds_limit(&message(), 1));
        assert!(limiter.exceeds_limit(&message(), 2));
    }

    #[test]
    fn test_exceeds_max_to_limit() {
        let limiter = BatchLimiter::new(2, None);
        assert!(!limiter.exceeds_limit(&message(), 0));
        assert!(limiter.exceeds_limit(&message(), 1));
    }

    #[test]
    fn test_huge_addition_saturates() {
        let limiter = BatchLimiter::new(2, Some(5));
        assert_eq!(
            limiter.batch_recipient_count(&message(), usize::MAX),
            Some(usize::MAX)
        );
        assert!(limiter.exceeds_limit(&message(), usize::MAX));
    }

    #[test]
    fn test_unlimited() {
        let limiter = BatchLimiter::default();
        assert!(!limiter.exceeds_limit(&message(), 10_000));
    }
}
