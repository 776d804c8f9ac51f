//! Translation of an [`OutboundMessage`] into Mailgun's batch-send shape.
//!
//! Placeholders in the per-recipient token maps are rewritten to
//! `%recipient.<name>%` markers, and each recipient's values are collected
//! into the `recipient-variables` map Mailgun substitutes from.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::OutboundMessage;

/// Per-recipient map from normalized token name to substitution value.
pub type RecipientVariables = BTreeMap<String, BTreeMap<String, String>>;

/// Normalize a placeholder into a recipient-variable name.
///
/// Strips wrapping `{` and `}` characters, then replaces every character
/// outside `[A-Za-z0-9]` with `_`.
pub fn normalize_token(placeholder: &str) -> String {
    placeholder
        .trim_matches(|c| c == '{' || c == '}')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The provider marker that replaces a placeholder.
pub fn recipient_marker(name: &str) -> String {
    format!("%recipient.{}%", name)
}

/// A message rewritten for per-recipient substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedMessage {
    /// Formatted sender, e.g. `Name <sender@example.com>`.
    pub from: String,
    /// Batch recipients.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses.
    pub bcc: Vec<String>,
    /// Subject with placeholders rewritten.
    pub subject: String,
    /// HTML body with placeholders rewritten.
    pub html: Option<String>,
    /// Text body with placeholders rewritten.
    pub text: Option<String>,
    /// Headers with placeholders rewritten.
    pub headers: Vec<(String, String)>,
    /// Recipient to normalized token values; empty when no tokens were given.
    pub recipient_variables: RecipientVariables,
    /// Normalized names shared by more than one distinct placeholder.
    pub collisions: Vec<String>,
}

impl PreparedMessage {
    /// Whether any recipient carries at least one token.
    pub fn has_recipient_variables(&self) -> bool {
        self.recipient_variables.values().any(|vars| !vars.is_empty())
    }
}

/// Rewrites messages for Mailgun batch sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageTranslator;

impl MessageTranslator {
    /// Create a new translator.
    pub fn new() -> Self {
        Self
    }

    /// Translate a message.
    pub fn translate(&self, message: &OutboundMessage) -> PreparedMessage {
        let replacements = self.replacements(message);

        let mut collisions = BTreeMap::<&str, BTreeSet<&str>>::new();
        for (placeholder, name) in &replacements {
            collisions
                .entry(name.as_str())
                .or_default()
                .insert(placeholder.as_str());
        }
        let collisions: Vec<String> = collisions
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        if !collisions.is_empty() {
            // The lexicographically last placeholder supplies the value
            warn!(?collisions, "Distinct tokens normalize to the same recipient variable");
        }

        let rewrite = |input: &str| -> String {
            replacements
                .iter()
                .fold(input.to_string(), |acc, (placeholder, name)| {
                    acc.replace(placeholder.as_str(), &recipient_marker(name))
                })
        };

        let mut recipient_variables = RecipientVariables::new();
        let mut to = Vec::new();
        for entry in &message.tokens {
            if !to.contains(&entry.recipient) {
                to.push(entry.recipient.clone());
            }
            let vars = recipient_variables.entry(entry.recipient.clone()).or_default();
            for (placeholder, value) in &entry.tokens {
                vars.insert(normalize_token(placeholder), value.clone());
            }
        }

        if to.is_empty() {
            for addr in &message.to {
                if !to.contains(&addr.email) {
                    to.push(addr.email.clone());
                }
            }
        }

        let prepared = PreparedMessage {
            from: message
                .from
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            to,
            cc: message.cc.iter().map(ToString::to_string).collect(),
            bcc: message.bcc.iter().map(ToString::to_string).collect(),
            subject: rewrite(message.subject.as_deref().unwrap_or_default()),
            html: message.html.as_deref().map(&rewrite),
            text: message.text.as_deref().map(&rewrite),
            headers: message
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), rewrite(value)))
                .collect(),
            recipient_variables,
            collisions,
        };

        debug!(
            recipients = prepared.to.len(),
            tokens = replacements.len(),
            "Prepared message for batch send"
        );

        prepared
    }

    /// Every distinct placeholder across all recipients, paired with its
    /// normalized name, in first-seen order.
    fn replacements(&self, message: &OutboundMessage) -> Vec<(String, String)> {
        let mut seen = BTreeSet::new();
        let mut replacements = Vec::new();
        for entry in &message.tokens {
            for placeholder in entry.tokens.keys() {
                if seen.insert(placeholder.as_str()) {
                    replacements.push((placeholder.clone(), normalize_token(placeholder)));
                }
            }
        }
        replacements
    }
}
