//! Outbound message types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{Address, IntoAddress, MailError, Result};

/// Template tokens for one recipient of a batch send.
///
/// Keys are the placeholders exactly as they appear in the message
/// (for example `{contactfield=firstname}`), values are what the
/// placeholder should become for this recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientTokens {
    /// Recipient email address.
    pub recipient: String,
    /// Placeholder to substitution value.
    pub tokens: BTreeMap<String, String>,
}

/// A fully composed message, ready to hand to a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Sender address.
    pub from: Option<Address>,
    /// To recipients.
    pub to: Vec<Address>,
    /// CC recipients.
    pub cc: Vec<Address>,
    /// BCC recipients.
    pub bcc: Vec<Address>,
    /// Email subject.
    pub subject: Option<String>,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// Custom headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Per-recipient template tokens, in insertion order.
    pub tokens: Vec<RecipientTokens>,
    /// Message ID.
    pub message_id: Option<String>,
}

impl OutboundMessage {
    /// Create a new empty message.
    pub fn new() -> Self {
        Self {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: None,
            text: None,
            html: None,
            headers: Vec::new(),
            tokens: Vec::new(),
            message_id: None,
        }
    }

    /// Set the from address.
    pub fn from(mut self, from: impl IntoAddress) -> Self {
        self.from = from.into_address().ok();
        self
    }

    /// Add a To recipient.
    pub fn to(mut self, to: impl IntoAddress) -> Self {
        if let Ok(addr) = to.into_address() {
            self.to.push(addr);
        }
        self
    }

    /// Add a CC recipient.
    pub fn cc(mut self, cc: impl IntoAddress) -> Self {
        if let Ok(addr) = cc.into_address() {
            self.cc.push(addr);
        }
        self
    }

    /// Add a BCC recipient.
    pub fn bcc(mut self, bcc: impl IntoAddress) -> Self {
        if let Ok(addr) = bcc.into_address() {
            self.bcc.push(addr);
        }
        self
    }

    /// Set the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the plain text body.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add template tokens for a recipient, merging with any already set.
    pub fn recipient_tokens<I, K, V>(mut self, recipient: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let recipient = recipient.into();
        let tokens = tokens.into_iter().map(|(k, v)| (k.into(), v.into()));

        match self.tokens.iter().position(|t| t.recipient == recipient) {
            Some(index) => self.tokens[index].tokens.extend(tokens),
            None => self.tokens.push(RecipientTokens {
                recipient,
                tokens: tokens.collect(),
            }),
        }
        self
    }

    /// Set the message ID.
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Look up a header value, ignoring the case of the name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every to, cc and bcc address, in that order.
    pub fn all_recipients(&self) -> Vec<String> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|addr| addr.email.clone())
            .collect()
    }

    /// Number of to, cc and bcc addresses.
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }

    /// Give the message a fresh ID, returning it.
    pub fn regenerate_id(&mut self) -> &str {
        let domain = self
            .from
            .as_ref()
            .map(Address::domain)
            .filter(|d| !d.is_empty())
            .unwrap_or("localhost");

        self.message_id
            .insert(format!("{}@{}", Uuid::new_v4().simple(), domain))
    }

    /// Check that the message has a sender and somewhere to go.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_none() {
            return Err(MailError::MissingField("from"));
        }
        if self.recipient_count() == 0 && self.tokens.is_empty() {
            return Err(MailError::MissingField("to/cc/bcc"));
        }
        Ok(())
    }
}

impl Default for OutboundMessage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder() {
        let message = OutboundMessage::new()
            .from("Sender <sender@example.com>")
            .to("a@example.com")
            .cc("b@example.com")
            .bcc("c@example.com")
            .subject("Test")
            .text("Hello, world!");

        assert!(message.validate().is_ok());
        assert_eq!(message.recipient_count(), 3);
        assert_eq!(
            message.all_recipients(),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_message_missing_from() {
        let message = OutboundMessage::new()
            .to("recipient@example.com")
            .subject("Test")
            .text("Hello");

        assert!(matches!(
            message.validate(),
            Err(MailError::MissingField("from"))
        ));
    }

    #[test]
    fn test_message_needs_a_recipient() {
        let message = OutboundMessage::new().from("sender@example.com").text("Hello");
        assert!(matches!(
            message.validate(),
            Err(MailError::MissingField("to/cc/bcc"))
        ));

        let message = message.recipient_tokens("a@example.com", [("{name}", "Ann")]);
        assert!(message.validate().is_ok());
    }

    #[test]
    fn test_invalid_sender_is_dropped() {
        let message = OutboundMessage::new()
            .from("Tom <tj@example.com")
            .to("a@example.com");
        assert!(message.from.is_none());
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_recipient_tokens_merge() {
        let message = OutboundMessage::new()
            .recipient_tokens("a@example.com", [("{name}", "Ann")])
            .recipient_tokens("b@example.com", [("{name}", "Bob")])
            .recipient_tokens("a@example.com", [("{city}", "Oslo")]);

        assert_eq!(message.tokens.len(), 2);
        assert_eq!(message.tokens[0].recipient, "a@example.com");
        assert_eq!(message.tokens[0].tokens.len(), 2);
        assert_eq!(message.tokens[0].tokens["{city}"], "Oslo");
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let message = OutboundMessage::new().header("X-Custom-Id", "42");
        assert_eq!(message.header_value("x-custom-id"), Some("42"));
        assert_eq!(message.header_value("missing"), None);
    }

    #[test]
    fn test_regenerate_id() {
        let mut message = OutboundMessage::new()
            .from("sender@example.com")
            .message_id("old@example.com");

        let id = message.regenerate_id().to_string();
        assert_ne!(id, "old@example.com");
        assert!(id.ends_with("@example.com"));
        assert_eq!(message.message_id.as_deref(), Some(id.as_str()));
    }
}
