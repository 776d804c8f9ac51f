//! Delivery-event classification
//!
//! Turns a provider event into the suppression-list update it implies.

use tracing::debug;

use crate::event::{EventKind, WebhookEvent};
use crate::suppression::{SuppressionKind, SuppressionTarget, SuppressionUpdate};

/// Reason recorded for every `unsubscribed` event.
pub const UNSUBSCRIBED_REASON: &str = "User unsubscribed";

/// Work out the suppression kind and reason for an event.
///
/// Returns `None` for events that do not affect the suppression list.
pub fn classify(event: &WebhookEvent) -> Option<(SuppressionKind, String)> {
    let kind = event.kind()?;

    let classified = match kind {
        EventKind::Bounce | EventKind::Rejected | EventKind::PermanentFail | EventKind::Failed => {
            let reason = event
                .status_message()
                .filter(|m| !m.is_empty())
                .or_else(|| event.status_description().filter(|d| !d.is_empty()))
                .unwrap_or(kind.as_str());
            (SuppressionKind::Bounced, reason.to_string())
        }
        EventKind::Complained => {
            // Any message, even an empty one, wins over the event name
            let reason = event.status_message().unwrap_or(kind.as_str());
            (SuppressionKind::Unsubscribed, reason.to_string())
        }
        EventKind::Unsubscribed => (
            SuppressionKind::Unsubscribed,
            UNSUBSCRIBED_REASON.to_string(),
        ),
    };

    Some(classified)
}

/// Resolve the suppression update for an event, if it implies one.
///
/// A custom identifier of the form `<hash>-<email>` targets the contact by
/// hash, but only when the echoed email equals the reported recipient.
/// Otherwise the update falls back to the raw recipient address.
pub fn resolve(event: &WebhookEvent) -> Option<SuppressionUpdate> {
    let Some((kind, reason)) = classify(event) else {
        debug!(event = %event.event, "Ignoring delivery event");
        return None;
    };

    let custom_id = event.custom_id();
    let channel_id = custom_id.as_deref().map(parse_channel_id);

    if let Some((hash, email)) = custom_id.as_deref().and_then(split_custom_id) {
        if email == event.recipient {
            return Some(SuppressionUpdate {
                target: SuppressionTarget::HashId {
                    hash: hash.to_string(),
                    email: email.to_string(),
                },
                kind,
                reason,
            });
        }

        debug!(
            recipient = %event.recipient,
            echoed = %email,
            "Custom identifier does not match recipient, suppressing by address"
        );
    }

    Some(SuppressionUpdate {
        target: SuppressionTarget::Address {
            address: event.recipient.clone(),
            channel_id,
        },
        kind,
        reason,
    })
}

/// Split a custom identifier at its first `-` into (hash, email)
pub fn split_custom_id(custom_id: &str) -> Option<(&str, &str)> {
    if custom_id.is_empty() {
        return None;
    }
    custom_id.split_once('-')
}

/// Best-effort integer parse of a custom identifier.
///
/// Reads an optional sign followed by leading digits, ignoring
/// surrounding whitespace and anything after the digits; yields 0 when
/// there are no leading digits.
pub fn parse_channel_id(custom_id: &str) -> i64 {
    let trimmed = custom_id.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let digits = &rest[..digits_len];
    if digits.is_empty() {
        return 0;
    }

    match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    }
}
