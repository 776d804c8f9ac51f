//! # Courier Mail
//!
//! Outbound batch email through the Mailgun HTTP API.
//!
//! ## Features
//!
//! - **Batch Templating**: per-recipient tokens become Mailgun recipient variables
//! - **Regions**: US, EU or any other `api.<region>.mailgun.net` host
//! - **Batch Limits**: configurable "to" limit and total recipient cap
//! - **Typed Failures**: configuration, transport and unexpected errors, with failed recipients
//! - **Delivery Callbacks**: signed webhook events feed a suppression list
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_mail::prelude::*;
//! use courier_webhooks::InMemorySuppressionList;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = MailgunConfig::from_env()?;
//!     let transport = MailgunTransport::new(config, Arc::new(InMemorySuppressionList::new()))?;
//!
//!     let mut message = OutboundMessage::new()
//!         .from("news@example.com")
//!         .subject("Hello {name}")
//!         .text("Hi {name}, this is your weekly update.")
//!         .recipient_tokens("ann@example.com", [("{name}", "Ann")])
//!         .recipient_tokens("bob@example.com", [("{name}", "Bob")]);
//!
//!     let report = transport.send(&mut message).await?;
//!     println!("batch size: {:?}", report.recipient_count);
//!     Ok(())
//! }
//! ```

mod address;
mod batch;
mod config;
mod error;
mod events;
mod mailgun;
mod message;
mod payload;
mod region;
pub mod translator;
mod transport;

pub use address::{Address, IntoAddress};
pub use batch::BatchLimiter;
pub use config::{FileFormat, MailgunConfig, DEFAULT_CUSTOM_ID_HEADER};
pub use error::{MailError, Result, SendErrorKind, SendFailure};
pub use events::{SendEvent, SendListener, SendStatus};
pub use mailgun::MailgunTransport;
pub use message::{OutboundMessage, RecipientTokens};
pub use payload::{WirePayload, CUSTOM_ID_FIELD};
pub use region::{resolve_host, MailgunRegion, PROVIDER_DOMAIN};
pub use translator::{MessageTranslator, PreparedMessage};
pub use transport::{SendReport, SendResult, Transport};

pub use courier_webhooks::{CallbackHandler, CallbackOutcome, SuppressionList};

/// Prelude for common imports.
///
/// ```
/// use courier_mail::prelude::*;
/// ```
pub mod prelude {
    pub use crate::address::{Address, IntoAddress};
    pub use crate::config::MailgunConfig;
    pub use crate::error::{MailError, Result, SendErrorKind, SendFailure};
    pub use crate::events::{SendEvent, SendListener, SendStatus};
    pub use crate::mailgun::MailgunTransport;
    pub use crate::message::OutboundMessage;
    pub use crate::region::MailgunRegion;
    pub use crate::transport::{SendReport, SendResult, Transport};
    pub use courier_webhooks::CallbackHandler;
}
