//! Delivery-event payload types
//!
//! Mailgun posts one event per request, wrapped as
//! `{"signature": {...}, "event-data": {...}}`. Everything inside
//! `event-data` is parsed leniently so that new provider fields or odd
//! value types never turn into hard failures.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::signature::SignatureFields;

/// User variable that carries the per-send custom identifier.
pub const CUSTOM_ID_VARIABLE: &str = "CUSTOMID";

/// Delivery events that lead to a suppression-list update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Hard bounce reported by the receiving server
    Bounce,
    /// Message rejected by the provider before delivery
    Rejected,
    /// Recipient marked the message as spam
    Complained,
    /// Recipient used the unsubscribe link
    Unsubscribed,
    /// Delivery permanently failed
    PermanentFail,
    /// Generic delivery failure
    Failed,
}

impl EventKind {
    /// Recognise a provider event name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bounce" => Some(Self::Bounce),
            "rejected" => Some(Self::Rejected),
            "complained" => Some(Self::Complained),
            "unsubscribed" => Some(Self::Unsubscribed),
            "permanent_fail" => Some(Self::PermanentFail),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// The provider's name for this event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bounce => "bounce",
            Self::Rejected => "rejected",
            Self::Complained => "complained",
            Self::Unsubscribed => "unsubscribed",
            Self::PermanentFail => "permanent_fail",
            Self::Failed => "failed",
        }
    }

    /// Whether the event is one of the bounce-like failures
    pub fn is_bounce(&self) -> bool {
        matches!(
            self,
            Self::Bounce | Self::Rejected | Self::PermanentFail | Self::Failed
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SMTP-level detail attached to failure events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Message returned by the receiving server
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    /// Provider-side description of the failure
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// A single delivery event from the `event-data` field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `bounce` or `delivered`
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub event: String,

    /// Recipient address as reported by the provider
    #[serde(default, deserialize_with = "lenient_string_or_empty")]
    pub recipient: String,

    /// Delivery status detail, when present
    #[serde(
        rename = "delivery-status",
        default,
        deserialize_with = "lenient_delivery_status"
    )]
    pub delivery_status: Option<DeliveryStatus>,

    /// Custom variables attached to the original send
    #[serde(rename = "user-variables", default, deserialize_with = "lenient_map")]
    pub user_variables: Map<String, Value>,
}

impl WebhookEvent {
    /// Parse an event object
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The recognised kind of this event, if any
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event)
    }

    /// The custom identifier carried in the `CUSTOMID` user variable
    pub fn custom_id(&self) -> Option<String> {
        match self.user_variables.get(CUSTOM_ID_VARIABLE)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Delivery-status message, if present
    pub fn status_message(&self) -> Option<&str> {
        self.delivery_status.as_ref()?.message.as_deref()
    }

    /// Delivery-status description, if present
    pub fn status_description(&self) -> Option<&str> {
        self.delivery_status.as_ref()?.description.as_deref()
    }
}

/// The envelope of a callback request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackBody {
    /// Signature block, when the provider signed the request
    #[serde(default)]
    pub signature: Option<SignatureFields>,

    /// The event object
    #[serde(rename = "event-data", default)]
    pub event_data: Option<Value>,
}

impl CallbackBody {
    /// Parse a raw request body.
    ///
    /// Returns `None` when the body is not a JSON object carrying an
    /// `event-data` field; batched bodies are not supported.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        Self::from_value(value)
    }

    /// Same as [`CallbackBody::parse`], for an already-decoded body
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let event_data = map.remove("event-data").filter(|v| !v.is_null())?;
        let signature = map
            .remove("signature")
            .and_then(|v| serde_json::from_value(v).ok());

        Some(Self {
            signature,
            event_data: Some(event_data),
        })
    }

    /// Parse the carried event
    pub fn event(&self) -> Option<WebhookEvent> {
        let data = self.event_data.clone()?;
        WebhookEvent::from_value(data).ok()
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_delivery_status<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DeliveryStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

fn lenient_map<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
