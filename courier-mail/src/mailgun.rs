//! Mailgun email provider integration.
//!
//! [`MailgunTransport`] submits batch sends to the HTTP API and, through
//! [`CallbackHandler`], processes the delivery events Mailgun posts back.

use async_trait::async_trait;
use courier_webhooks::{CallbackHandler, CallbackOutcome, CallbackReceiver, SuppressionList};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    BatchLimiter, MailError, MailgunConfig, MessageTranslator, OutboundMessage, Result,
    SendEvent, SendFailure, SendListener, SendReport, SendResult, SendStatus, Transport,
    WirePayload,
};

/// Mailgun transport.
pub struct MailgunTransport {
    client: Client,
    config: MailgunConfig,
    limiter: BatchLimiter,
    translator: MessageTranslator,
    callbacks: CallbackReceiver,
    listeners: Vec<Arc<dyn SendListener>>,
    started: AtomicBool,
}

impl std::fmt::Debug for MailgunTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunTransport")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

impl MailgunTransport {
    /// Create a new Mailgun transport.
    ///
    /// `suppressions` receives the updates derived from delivery callbacks.
    pub fn new(config: MailgunConfig, suppressions: Arc<dyn SuppressionList>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MailError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            limiter: BatchLimiter::from_config(&config),
            translator: MessageTranslator::new(),
            callbacks: CallbackReceiver::new(config.webhook_signing_key.clone(), suppressions),
            listeners: Vec::new(),
            started: AtomicBool::new(false),
            config,
        })
    }

    /// Register a send listener.
    pub fn with_listener(mut self, listener: Arc<dyn SendListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &MailgunConfig {
        &self.config
    }

    /// The batch limits in effect.
    pub fn batch_limiter(&self) -> &BatchLimiter {
        &self.limiter
    }

    /// Maximum number of "to" addresses per batch, 0 if unlimited.
    pub fn max_batch_limit(&self) -> u32 {
        self.limiter.max_batch_limit()
    }

    /// Recipients the batch would hold after adding `to_be_added` more.
    pub fn batch_recipient_count(
        &self,
        message: &OutboundMessage,
        to_be_added: usize,
    ) -> Option<usize> {
        self.limiter.batch_recipient_count(message, to_be_added)
    }

    /// Check credentials and mark the transport as started.
    ///
    /// Fails without touching the network when no API key is configured.
    pub fn start(&self) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(MailError::Config("API key required".to_string()));
        }

        if !self.started.swap(true, Ordering::SeqCst) {
            info!(
                domain = %self.config.domain,
                region = %self.config.region,
                "Mailgun transport started"
            );
        }
        Ok(())
    }

    /// Whether [`MailgunTransport::start`] has succeeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Mark the transport as stopped.
    pub fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
    }

    /// Translate and post a message, returning the batch recipient count.
    async fn submit(&self, message: &OutboundMessage) -> Result<Option<usize>> {
        message.validate()?;
        let count = self.limiter.batch_recipient_count(message, 1);

        let prepared = self.translator.translate(message);
        let custom_id = message
            .header_value(&self.config.custom_id_header)
            .map(str::to_string);

        let payload = WirePayload::new(&prepared, custom_id)?;
        debug!(
            recipient_variables = ?payload.recipient_variables,
            "Recipient variables"
        );

        let headers = header_map(&prepared.headers)?;

        debug!(
            to = ?payload.to,
            subject = %payload.subject,
            "Sending email via Mailgun"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .basic_auth("api", Some(&self.config.api_key))
            .headers(headers)
            .form(&payload.form_fields())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(error_from_response(response).await);
        }

        Ok(count)
    }

    fn notify(&self, event: &SendEvent) {
        for listener in &self.listeners {
            listener.send_performed(event);
        }
    }
}

#[async_trait]
impl Transport for MailgunTransport {
    async fn send(&self, message: &mut OutboundMessage) -> SendResult {
        if !self.is_started() {
            self.start().map_err(SendFailure::before_send)?;
        }

        if !self.listeners.iter().all(|l| l.before_send(&*message)) {
            debug!("Send cancelled by listener");
            return Ok(SendReport::cancelled());
        }

        match self.submit(message).await {
            Ok(count) => {
                info!(recipients = ?count, "Email sent successfully via Mailgun");
                self.notify(&SendEvent {
                    status: SendStatus::Success,
                    failed_recipients: Vec::new(),
                    message_id: message.message_id.clone(),
                });
                Ok(SendReport::sent(count))
            }
            Err(error) => {
                let failed_recipients = message.all_recipients();
                warn!(
                    error = %error,
                    failed = failed_recipients.len(),
                    "Mailgun send failed"
                );

                self.notify(&SendEvent {
                    status: SendStatus::Failed,
                    failed_recipients: failed_recipients.clone(),
                    message_id: message.message_id.clone(),
                });
                message.regenerate_id();

                Err(SendFailure {
                    error,
                    failed_recipients,
                })
            }
        }
    }

    async fn is_healthy(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }
}

#[async_trait]
impl CallbackHandler for MailgunTransport {
    fn verify_callback(&self, token: &str, timestamp: &str, signature: &str) -> bool {
        self.callbacks.verify_callback(token, timestamp, signature)
    }

    async fn process_value(&self, body: Value) -> courier_webhooks::Result<CallbackOutcome> {
        self.callbacks.process_value(body).await
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| MailError::Unexpected(format!("Invalid header name {}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| MailError::Unexpected(format!("Invalid value for header {}: {}", name, e)))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

async fn error_from_response(response: Response) -> MailError {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(status, error = %e, "Failed to read Mailgun error body");
            format!("unreadable response body: {}", e)
        }
    };

    let message = if is_json {
        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body)
    } else {
        body
    };

    MailError::Transport { status, message }
}
