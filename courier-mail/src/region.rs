//! Mailgun API region resolution.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Domain shared by every regional API host.
pub const PROVIDER_DOMAIN: &str = "mailgun.net";

/// Mailgun API region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MailgunRegion {
    /// US region (default), served from the unprefixed host.
    #[default]
    Us,
    /// EU region.
    Eu,
    /// Any other region code, used verbatim as the host prefix.
    Other(String),
}

impl MailgunRegion {
    /// Map a configured region code to a region.
    ///
    /// An empty code means the default US region.
    pub fn from_code(code: &str) -> Self {
        match code {
            "" | "us" => Self::Us,
            "eu" => Self::Eu,
            other => Self::Other(other.to_string()),
        }
    }

    /// The region code.
    pub fn code(&self) -> &str {
        match self {
            Self::Us => "us",
            Self::Eu => "eu",
            Self::Other(code) => code,
        }
    }

    /// The API host for this region.
    pub fn host(&self) -> String {
        match self {
            Self::Us => format!("api.{}", PROVIDER_DOMAIN),
            other => format!("api.{}.{}", other.code(), PROVIDER_DOMAIN),
        }
    }
}

/// Resolve the API host for a region code.
pub fn resolve_host(region: &str) -> String {
    MailgunRegion::from_code(region).host()
}

impl fmt::Display for MailgunRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&str> for MailgunRegion {
    fn from(code: &str) -> Self {
        Self::from_code(code)
    }
}

impl Serialize for MailgunRegion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for MailgunRegion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::from_code(&code))
    }
}
