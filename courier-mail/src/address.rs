//! Sender and recipient addresses.

use crate::{MailError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mailbox: bare `user@host` or `Display Name <user@host>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    pub name: Option<String>,
}

impl Address {
    /// Parse `user@host` or `Name <user@host>`.
    ///
    /// The mailbox is taken from the last `<...>` group, so display names may
    /// contain angle brackets.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (name, email) = match input.strip_suffix('>').and_then(|s| s.rsplit_once('<')) {
            Some((name, email)) => (name.trim().trim_matches('"').trim(), email.trim()),
            None if input.contains('<') || input.contains('>') => {
                return Err(MailError::InvalidAddress(format!(
                    "Unbalanced angle brackets: {}",
                    input
                )));
            }
            None => ("", input),
        };

        check_mailbox(email)?;
        Ok(Self {
            email: email.to_string(),
            name: (!name.is_empty()).then(|| name.to_string()),
        })
    }

    /// Host part of the mailbox.
    pub fn domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// Values the message builder accepts as an address.
pub trait IntoAddress {
    fn into_address(self) -> Result<Address>;
}

impl IntoAddress for Address {
    fn into_address(self) -> Result<Address> {
        Ok(self)
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> Result<Address> {
        Address::parse(self)
    }
}

impl IntoAddress for String {
    fn into_address(self) -> Result<Address> {
        Address::parse(&self)
    }
}

fn check_mailbox(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, host)) => {
            !local.is_empty()
                && !host.contains('@')
                && host.contains('.')
                && !host.starts_with('.')
                && !host.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(MailError::InvalidAddress(format!("Invalid email format: {:?}", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_named() {
        let addr = Address::parse(" news@example.com ").unwrap();
        assert_eq!(addr.email, "news@example.com");
        assert!(addr.name.is_none());

        let addr = Address::parse("\"Weekly News\" <news@example.com>").unwrap();
        assert_eq!(addr.email, "news@example.com");
        assert_eq!(addr.name.as_deref(), Some("Weekly News"));

        let addr = Address::parse("<news@example.com>").unwrap();
        assert!(addr.name.is_none());
    }

    #[test]
    fn test_display_name_with_angle_brackets() {
        let addr = Address::parse("Tom > Jerry <tj@example.com>").unwrap();
        assert_eq!(addr.email, "tj@example.com");
        assert_eq!(addr.name.as_deref(), Some("Tom > Jerry"));

        let addr = Address::parse("a <b> c <tj@example.com>").unwrap();
        assert_eq!(addr.email, "tj@example.com");
    }

    #[test]
    fn test_unbalanced_brackets_rejected() {
        for input in ["Tom <tj@example.com", "tj@example.com>", "Tom > tj@example.com"] {
            assert!(
                matches!(Address::parse(input), Err(MailError::InvalidAddress(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn test_invalid_mailboxes() {
        for input in ["", "invalid", "@example.com", "test@", "a@b@example.com", "a@localhost", "a b@example.com"] {
            assert!(Address::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_display_and_domain() {
        let addr = Address::parse("Sender <news@mail.example.com>").unwrap();
        assert_eq!(addr.to_string(), "Sender <news@mail.example.com>");
        assert_eq!(addr.domain(), "mail.example.com");

        let addr = "news@example.com".into_address().unwrap();
        assert_eq!(addr.to_string(), "news@example.com");
    }
}
