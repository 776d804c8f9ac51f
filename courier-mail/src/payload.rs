//! Form payload for the Mailgun messages endpoint.

use serde::Serialize;

use crate::translator::PreparedMessage;
use crate::Result;

/// Form field carrying the per-send custom identifier.
pub const CUSTOM_ID_FIELD: &str = "v:CUSTOMID";

/// The flattened form fields posted to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WirePayload {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    /// JSON-encoded recipient variables, omitted when no recipient has tokens.
    pub recipient_variables: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    /// Value for the `v:CUSTOMID` variable.
    pub custom_id: Option<String>,
}

impl WirePayload {
    /// Build the payload for a prepared message.
    pub fn new(message: &PreparedMessage, custom_id: Option<String>) -> Result<Self> {
        let recipient_variables = if message.has_recipient_variables() {
            Some(serde_json::to_string(&message.recipient_variables)?)
        } else {
            None
        };

        Ok(Self {
            from: message.from.clone(),
            to: message.to.clone(),
            subject: message.subject.clone(),
            html: message.html.clone(),
            text: message.text.clone(),
            recipient_variables,
            cc: message.cc.clone(),
            bcc: message.bcc.clone(),
            custom_id,
        })
    }

    /// Form fields in submission order; list fields repeat their key.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("from", self.from.clone())];
        fields.extend(self.to.iter().map(|addr| ("to", addr.clone())));
        fields.push(("subject", self.subject.clone()));

        if let Some(html) = &self.html {
            fields.push(("html", html.clone()));
        }
        if let Some(text) = &self.text {
            fields.push(("text", text.clone()));
        }
        if let Some(vars) = &self.recipient_variables {
            fields.push(("recipient-variables", vars.clone()));
        }

        fields.extend(self.cc.iter().map(|addr| ("cc", addr.clone())));
        fields.extend(self.bcc.iter().map(|addr| ("bcc", addr.clone())));

        if let Some(custom_id) = &self.custom_id {
            fields.push((CUSTOM_ID_FIELD, custom_id.clone()));
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageTranslator, OutboundMessage};

    #[test]
    fn test_payload_without_tokens_omits_recipient_variables() {
        let message = OutboundMessage::new()
            .from("news@example.com")
            .to("a@example.com")
            .subject("Hello")
            .html("<p>Hi</p>");
        let prepared = MessageTranslator::new().translate(&message);

        let payload = WirePayload::new(&prepared, None).unwrap();
        assert!(payload.recipient_variables.is_none());
        assert_eq!(
            payload.form_fields(),
            vec![
                ("from", "news@example.com".to_string()),
                ("to", "a@example.com".to_string()),
                ("subject", "Hello".to_string()),
                ("html", "<p>Hi</p>".to_string()),
            ]
        );
    }

    #[test]
    fn test_payload_with_tokens_and_custom_id() {
        let message = OutboundMessage::new()
            .from("news@example.com")
            .cc("c@example.com")
            .bcc("d@example.com")
            .subject("Hello {name}")
            .text("Hi {name}")
            .recipient_tokens("a@example.com", [("{name}", "Ann")])
            .recipient_tokens("b@example.com", [("{name}", "Bob")]);
        let prepared = MessageTranslator::new().translate(&message);

        let payload = WirePayload::new(&prepared, Some("abc123-a@example.com".into())).unwrap();
        let vars: serde_json::Value =
            serde_json::from_str(payload.recipient_variables.as_deref().unwrap()).unwrap();
        assert_eq!(
            vars,
            serde_json::json!({
                "a@example.com": {"name": "Ann"},
                "b@example.com": {"name": "Bob"}
            })
        );

        let fields = payload.form_fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "from",
                "to",
                "to",
                "subject",
                "text",
                "recipient-variables",
                "cc",
                "bcc",
                CUSTOM_ID_FIELD
            ]
        );
        assert!(fields.contains(&("subject", "Hello %recipient.name%".to_string())));
    }
}
