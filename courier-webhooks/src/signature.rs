//! Callback signature verification
//!
//! Mailgun signs every callback with HMAC-SHA256 over `timestamp + token`,
//! keyed with the account's webhook signing key, and sends the hex digest
//! alongside the event.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (in seconds) of a callback timestamp before it is rejected.
pub const DEFAULT_TOLERANCE_SECS: u64 = 15;

/// The `signature` block carried by a signed callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureFields {
    /// Random token generated by the provider for this callback
    pub token: String,
    /// Unix timestamp, in seconds, as a string
    #[serde(deserialize_with = "string_or_number")]
    pub timestamp: String,
    /// Hex-encoded HMAC-SHA256 digest
    pub signature: String,
}

/// Verifier for signed provider callbacks
#[derive(Clone)]
pub struct CallbackSignature {
    secret: String,
    tolerance_secs: u64,
}

impl std::fmt::Debug for CallbackSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSignature")
            .field("secret", &"[redacted]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl CallbackSignature {
    /// Create a verifier keyed with the webhook signing key
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Set the replay window in seconds
    pub fn with_tolerance(mut self, seconds: u64) -> Self {
        self.tolerance_secs = seconds;
        self
    }

    /// The replay window in seconds
    pub fn tolerance(&self) -> u64 {
        self.tolerance_secs
    }

    /// Produce the hex signature the provider would send for `timestamp` and `token`
    pub fn sign(&self, timestamp: &str, token: &str) -> Option<String> {
        let mac = self.mac_for(timestamp, token)?;
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a callback against the current time
    pub fn verify(&self, token: &str, timestamp: &str, signature: &str) -> bool {
        self.verify_at(token, timestamp, signature, chrono::Utc::now().timestamp())
    }

    /// Verify a callback against an explicit "now" (Unix seconds)
    pub fn verify_at(&self, token: &str, timestamp: &str, signature: &str, now: i64) -> bool {
        if self.secret.is_empty() {
            warn!("No webhook signing key configured, rejecting callback");
            return false;
        }

        let Some(claimed) = parse_timestamp(timestamp) else {
            debug!(timestamp, "Callback timestamp is not numeric");
            return false;
        };

        let age = now.saturating_sub(claimed).unsigned_abs();
        if age > self.tolerance_secs {
            warn!(
                age,
                tolerance = self.tolerance_secs,
                "Rejecting callback outside the replay window"
            );
            return false;
        }

        // Mailgun sends lowercase hex digests
        if !signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };

        // verify_slice compares in constant time
        self.mac_for(timestamp, token)
            .is_some_and(|mac| mac.verify_slice(&expected).is_ok())
    }

    /// Verify a parsed `signature` block
    pub fn verify_fields(&self, fields: &SignatureFields) -> bool {
        self.verify(&fields.token, &fields.timestamp, &fields.signature)
    }

    fn mac_for(&self, timestamp: &str, token: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(timestamp.as_bytes());
        mac.update(token.as_bytes());
        Some(mac)
    }
}

/// Parse a Unix timestamp in seconds, tolerating a fractional part
fn parse_timestamp(timestamp: &str) -> Option<i64> {
    let timestamp = timestamp.trim();
    if let Ok(secs) = timestamp.parse::<i64>() {
        return Some(secs);
    }

    timestamp
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .map(|secs| secs.trunc() as i64)
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
