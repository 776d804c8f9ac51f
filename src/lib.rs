// Courier - Mailgun batch email dispatch for Rust
//
// This library sends templated batch email through the Mailgun HTTP API and
// turns Mailgun's signed delivery callbacks into suppression-list updates.

// Re-export outbound mail
#[cfg(feature = "mail")]
pub use courier_mail as mail;

// Re-export delivery callbacks
#[cfg(feature = "webhooks")]
pub use courier_webhooks as webhooks;

// Prelude for common imports
pub mod prelude {
    #[cfg(feature = "mail")]
    pub use courier_mail::{
        Address,
        IntoAddress,
        MailError,
        MailgunConfig,
        MailgunRegion,
        MailgunTransport,
        OutboundMessage,
        SendErrorKind,
        SendEvent,
        SendFailure,
        SendListener,
        SendReport,
        SendResult,
        SendStatus,
        Transport,
    };

    #[cfg(feature = "webhooks")]
    pub use courier_webhooks::{
        CallbackHandler,
        CallbackOutcome,
        CallbackReceiver,
        CallbackSignature,
        InMemorySuppressionList,
        SuppressionKind,
        SuppressionList,
        SuppressionTarget,
        SuppressionUpdate,
        WebhookError,
    };
}
