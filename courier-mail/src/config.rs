//! Mailgun transport configuration.
//!
//! Settings can be built in code, read from `MAILGUN_*` environment
//! variables (a `.env` file is honoured), or loaded from a JSON or TOML file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::{MailError, MailgunRegion, Result};

/// Header whose value is forwarded as the `v:CUSTOMID` variable.
pub const DEFAULT_CUSTOM_ID_HEADER: &str = "CUSTOMID";

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Mailgun configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailgunConfig {
    /// API key.
    pub api_key: String,
    /// Sending domain.
    pub domain: String,
    /// API endpoint region.
    pub region: MailgunRegion,
    /// Key used to sign delivery-event callbacks.
    pub webhook_signing_key: String,
    /// Maximum number of "to" addresses per batch, 0 for unlimited.
    pub max_batch_limit: u32,
    /// Per-batch recipient cap; `None` disables recipient counting.
    pub batch_recipient_count: Option<u32>,
    /// Message header copied into the `v:CUSTOMID` variable.
    pub custom_id_header: String,
    /// Override for `https://<region host>`, e.g. a proxy or test server.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header for API requests.
    pub user_agent: String,
}

impl Default for MailgunConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: String::new(),
            region: MailgunRegion::Us,
            webhook_signing_key: String::new(),
            max_batch_limit: 0,
            batch_recipient_count: None,
            custom_id_header: DEFAULT_CUSTOM_ID_HEADER.to_string(),
            base_url: None,
            timeout_secs: 30,
            user_agent: format!("Courier-Mail/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("api_key", &redact(&self.api_key))
            .field("domain", &self.domain)
            .field("region", &self.region)
            .field("webhook_signing_key", &redact(&self.webhook_signing_key))
            .field("max_batch_limit", &self.max_batch_limit)
            .field("batch_recipient_count", &self.batch_recipient_count)
            .field("custom_id_header", &self.custom_id_header)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "[redacted]" }
}

impl MailgunConfig {
    /// Create a new Mailgun configuration.
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Set the API region.
    pub fn region(mut self, region: impl Into<MailgunRegion>) -> Self {
        self.region = region.into();
        self
    }

    /// Use EU region.
    pub fn eu(mut self) -> Self {
        self.region = MailgunRegion::Eu;
        self
    }

    /// Set the webhook signing key.
    pub fn webhook_signing_key(mut self, key: impl Into<String>) -> Self {
        self.webhook_signing_key = key.into();
        self
    }

    /// Set the maximum number of "to" addresses per batch.
    pub fn max_batch_limit(mut self, limit: u32) -> Self {
        self.max_batch_limit = limit;
        self
    }

    /// Set the per-batch recipient cap.
    pub fn batch_recipient_count(mut self, count: Option<u32>) -> Self {
        self.batch_recipient_count = count;
        self
    }

    /// Set the header forwarded as `v:CUSTOMID`.
    pub fn custom_id_header(mut self, header: impl Into<String>) -> Self {
        self.custom_id_header = header.into();
        self
    }

    /// Send requests to this base URL instead of the region host.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// The request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API host for the configured region.
    pub fn host(&self) -> String {
        self.region.host()
    }

    /// The messages endpoint: `https://<host>/v3/<urlencoded domain>/messages`.
    pub fn endpoint(&self) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.host()));
        let domain: String = url::form_urlencoded::byte_serialize(self.domain.as_bytes()).collect();
        format!("{}/v3/{}/messages", base, domain)
    }

    /// Check the settings the host requires to be non-blank.
    ///
    /// A parsed region is never blank; the loaders reject a blank region
    /// string before it is parsed.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_signing_key.trim().is_empty() {
            return Err(MailError::Config(
                "Mailgun webhook signing key is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from `MAILGUN_*` environment variables, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from `MAILGUN_*` variables supplied by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("MAILGUN_API_KEY") {
            config.api_key = key;
        }
        if let Some(domain) = lookup("MAILGUN_DOMAIN") {
            config.domain = domain;
        }
        if let Some(region) = lookup("MAILGUN_REGION") {
            if region.trim().is_empty() {
                return Err(MailError::Config("Mailgun region is required".to_string()));
            }
            config.region = MailgunRegion::from_code(region.trim());
        }
        if let Some(key) = lookup("MAILGUN_WEBHOOK_SIGNING_KEY") {
            config.webhook_signing_key = key;
        }
        if let Some(limit) = lookup("MAILGUN_MAX_BATCH_LIMIT") {
            config.max_batch_limit = parse_number("MAILGUN_MAX_BATCH_LIMIT", &limit)?;
        }
        if let Some(count) = lookup("MAILGUN_BATCH_RECIPIENT_COUNT") {
            config.batch_recipient_count = if count.trim().is_empty() {
                None
            } else {
                Some(parse_number("MAILGUN_BATCH_RECIPIENT_COUNT", &count)?)
            };
        }
        if let Some(header) = lookup("MAILGUN_CUSTOM_ID_HEADER") {
            config.custom_id_header = header;
        }
        if let Some(url) = lookup("MAILGUN_BASE_URL") {
            config = config.base_url(url);
        }
        if let Some(secs) = lookup("MAILGUN_TIMEOUT_SECS") {
            config.timeout_secs = parse_number("MAILGUN_TIMEOUT_SECS", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON or TOML file, picking the format from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MailError::Config("No file extension found".to_string()))?;
        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| MailError::Config(format!("Unsupported format: {}", ext)))?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| MailError::Config(format!("Failed to read file: {}", e)))?;

        Self::from_str(&content, format)
    }

    /// Parse configuration from a string in the given format.
    pub fn from_str(content: &str, format: FileFormat) -> Result<Self> {
        let value: Value = match format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| MailError::Config(format!("JSON parse error: {}", e)))?,
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)
                    .map_err(|e| MailError::Config(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(toml_value)?
            }
        };

        if let Some(region) = value.get("region").and_then(Value::as_str)
            && region.trim().is_empty()
        {
            return Err(MailError::Config("Mailgun region is required".to_string()));
        }

        let config: Self = serde_json::from_value(value)
            .map_err(|e| MailError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MailError::Config(format!("{} must be a number, got {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_builder() {
        let config = MailgunConfig::new("key-abc", "mg.example.com")
            .eu()
            .webhook_signing_key("signing")
            .max_batch_limit(1000)
            .batch_recipient_count(Some(5));

        assert_eq!(config.region, MailgunRegion::Eu);
        assert_eq!(config.max_batch_limit, 1000);
        assert_eq!(config.batch_recipient_count, Some(5));
        assert_eq!(config.custom_id_header, DEFAULT_CUSTOM_ID_HEADER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint() {
        let config = MailgunConfig::new("key", "mg.example.com");
        assert_eq!(
            config.endpoint(),
            "https://api.mailgun.net/v3/mg.example.com/messages"
        );

        let config = MailgunConfig::new("key", "my domain/x").region("eu");
        assert_eq!(
            config.endpoint(),
            "https://api.eu.mailgun.net/v3/my+domain%2Fx/messages"
        );

        let config = MailgunConfig::new("key", "mg.example.com").base_url("http://127.0.0.1:9000/");
        assert_eq!(
            config.endpoint(),
            "http://127.0.0.1:9000/v3/mg.example.com/messages"
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = MailgunConfig::new("key-secret", "mg.example.com")
            .webhook_signing_key("signing-secret");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("key-secret"));
        assert!(!debug.contains("signing-secret"));
        assert!(debug.contains("mg.example.com"));
    }

    #[test]
    fn test_from_lookup() {
        let config = MailgunConfig::from_lookup(lookup(&[
            ("MAILGUN_API_KEY", "key-abc"),
            ("MAILGUN_DOMAIN", "mg.example.com"),
            ("MAILGUN_REGION", "eu"),
            ("MAILGUN_WEBHOOK_SIGNING_KEY", "signing"),
            ("MAILGUN_MAX_BATCH_LIMIT", "300"),
            ("MAILGUN_BATCH_RECIPIENT_COUNT", "5"),
            ("MAILGUN_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "key-abc");
        assert_eq!(config.region, MailgunRegion::Eu);
        assert_eq!(config.max_batch_limit, 300);
        assert_eq!(config.batch_recipient_count, Some(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_defaults_region() {
        let config =
            MailgunConfig::from_lookup(lookup(&[("MAILGUN_WEBHOOK_SIGNING_KEY", "signing")]))
                .unwrap();
        assert_eq!(config.region, MailgunRegion::Us);
        assert_eq!(config.batch_recipient_count, None);
    }

    #[test]
    fn test_from_lookup_rejects_blank_required_values() {
        let err = MailgunConfig::from_lookup(lookup(&[
            ("MAILGUN_REGION", " "),
            ("MAILGUN_WEBHOOK_SIGNING_KEY", "signing"),
        ]))
        .unwrap_err();
        assert!(matches!(err, MailError::Config(_)));

        let err = MailgunConfig::from_lookup(lookup(&[("MAILGUN_WEBHOOK_SIGNING_KEY", "")]))
            .unwrap_err();
        assert!(matches!(err, MailError::Config(_)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = MailgunConfig::from_lookup(lookup(&[
            ("MAILGUN_WEBHOOK_SIGNING_KEY", "signing"),
            ("MAILGUN_MAX_BATCH_LIMIT", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAILGUN_MAX_BATCH_LIMIT"));
    }

    #[test]
    fn test_from_toml() {
        let config = MailgunConfig::from_str(
            r#"
            api_key = "key-abc"
            domain = "mg.example.com"
            region = "eu"
            webhook_signing_key = "signing"
            batch_recipient_count = 5
            "#,
            FileFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.domain, "mg.example.com");
        assert_eq!(config.region, MailgunRegion::Eu);
        assert_eq!(config.batch_recipient_count, Some(5));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_from_json_rejects_blank_region() {
        let err = MailgunConfig::from_str(
            r#"{"region": "", "webhook_signing_key": "signing"}"#,
            FileFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, MailError::Config(_)));
    }

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("yaml"), None);
    }
}
