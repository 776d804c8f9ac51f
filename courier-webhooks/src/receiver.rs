//! Receiver for provider delivery callbacks

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::event::CallbackBody;
use crate::suppression::{SuppressionList, SuppressionUpdate};
use crate::{classifier, CallbackSignature, Result, WebhookError};

/// Path segment under which the host routes Mailgun callbacks.
pub const CALLBACK_PATH: &str = "mailgun_api";

/// What processing a callback body led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The body was not a single-event callback
    NotHandled,
    /// The event does not affect the suppression list
    Ignored {
        /// Event name as reported, possibly empty
        event: String,
    },
    /// The suppression list was updated
    Suppressed(SuppressionUpdate),
}

/// Capability to authenticate and process provider callbacks
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    /// Path segment the host should route callbacks from
    fn callback_path(&self) -> &str {
        CALLBACK_PATH
    }

    /// Check a callback's HMAC signature and timestamp freshness
    fn verify_callback(&self, token: &str, timestamp: &str, signature: &str) -> bool;

    /// Classify a decoded callback body and apply its suppression update
    async fn process_value(&self, body: Value) -> Result<CallbackOutcome>;

    /// Classify a raw callback body and apply its suppression update.
    ///
    /// Malformed bodies are not an error and yield
    /// [`CallbackOutcome::NotHandled`].
    async fn process_callback(&self, body: &[u8]) -> Result<CallbackOutcome> {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.process_value(value).await,
            Err(e) => {
                debug!(error = %e, "Callback body is not JSON");
                Ok(CallbackOutcome::NotHandled)
            }
        }
    }

    /// Verify the signature block carried in the body, then process it
    async fn receive(&self, body: &[u8]) -> Result<CallbackOutcome> {
        let value: Value = serde_json::from_slice(body)?;
        let parsed = CallbackBody::from_value(value.clone()).ok_or_else(|| {
            WebhookError::PayloadError("Callback body carries no event-data".to_string())
        })?;
        let fields = parsed.signature.ok_or(WebhookError::SignatureMissing)?;

        if !self.verify_callback(&fields.token, &fields.timestamp, &fields.signature) {
            warn!("Rejecting callback with invalid signature");
            return Err(WebhookError::SignatureInvalid(
                "Signature verification failed".to_string(),
            ));
        }

        self.process_value(value).await
    }
}

/// Callback handler backed by a signing key and a suppression list
#[derive(Clone)]
pub struct CallbackReceiver {
    signature: CallbackSignature,
    suppressions: Arc<dyn SuppressionList>,
}

impl std::fmt::Debug for CallbackReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackReceiver")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl CallbackReceiver {
    /// Create a receiver with the webhook signing key
    pub fn new(signing_key: impl Into<String>, suppressions: Arc<dyn SuppressionList>) -> Self {
        Self {
            signature: CallbackSignature::new(signing_key),
            suppressions,
        }
    }

    /// Create a receiver, rejecting a blank signing key
    pub fn try_new(
        signing_key: impl Into<String>,
        suppressions: Arc<dyn SuppressionList>,
    ) -> Result<Self> {
        let signing_key = signing_key.into();
        if signing_key.trim().is_empty() {
            return Err(WebhookError::ConfigError(
                "Webhook signing key is required".to_string(),
            ));
        }
        Ok(Self::new(signing_key, suppressions))
    }

    /// Set the replay window in seconds
    pub fn with_tolerance(mut self, seconds: u64) -> Self {
        self.signature = self.signature.with_tolerance(seconds);
        self
    }

    /// The signature verifier
    pub fn signature(&self) -> &CallbackSignature {
        &self.signature
    }
}

#[async_trait]
impl CallbackHandler for CallbackReceiver {
    fn verify_callback(&self, token: &str, timestamp: &str, signature: &str) -> bool {
        self.signature.verify(token, timestamp, signature)
    }

    async fn process_value(&self, body: Value) -> Result<CallbackOutcome> {
        let Some(parsed) = CallbackBody::from_value(body) else {
            debug!("Callback body has no event-data");
            return Ok(CallbackOutcome::NotHandled);
        };

        let Some(event) = parsed.event() else {
            debug!("Callback event-data could not be parsed");
            return Ok(CallbackOutcome::Ignored {
                event: String::new(),
            });
        };

        let Some(update) = classifier::resolve(&event) else {
            return Ok(CallbackOutcome::Ignored { event: event.event });
        };

        self.suppressions.apply(&update).await?;

        info!(
            event = %event.event,
            recipient = %event.recipient,
            kind = ?update.kind,
            "Applied suppression from delivery event"
        );

        Ok(CallbackOutcome::Suppressed(update))
    }
}
