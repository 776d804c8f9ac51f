//! Mailgun delivery-event callbacks for Courier
//!
//! This crate authenticates the provider's HMAC-signed callbacks and turns
//! bounce, complaint and unsubscribe events into suppression-list updates.
//!
//! # Features
//!
//! - **Signature Verification**: HMAC-SHA256 over `timestamp + token` with a 15 second replay window
//! - **Event Classification**: bounce, rejected, permanent_fail and failed suppress as bounced;
//!   complained and unsubscribed suppress as unsubscribed
//! - **Recipient Targeting**: per-send `<hash>-<email>` identifiers, with address fallback
//! - **Lenient Parsing**: malformed bodies and unknown events are skipped, not errors
//!
//! # Example
//!
//! ```rust,no_run
//! use courier_webhooks::{CallbackHandler, CallbackReceiver, InMemorySuppressionList};
//! use std::sync::Arc;
//!
//! # async fn run(body: &[u8]) -> courier_webhooks::Result<()> {
//! let suppressions = Arc::new(InMemorySuppressionList::new());
//! let receiver = CallbackReceiver::new("webhook-signing-key", suppressions.clone());
//!
//! // Verifies the body's signature block, then applies the event
//! let outcome = receiver.receive(body).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
mod error;
mod event;
mod receiver;
mod signature;
mod suppression;

pub use error::WebhookError;
pub use event::{CallbackBody, DeliveryStatus, EventKind, WebhookEvent, CUSTOM_ID_VARIABLE};
pub use receiver::{CallbackHandler, CallbackOutcome, CallbackReceiver, CALLBACK_PATH};
pub use signature::{CallbackSignature, SignatureFields, DEFAULT_TOLERANCE_SECS};
pub use suppression::{
    InMemorySuppressionList, SuppressionKind, SuppressionList, SuppressionRecord,
    SuppressionTarget, SuppressionUpdate,
};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
