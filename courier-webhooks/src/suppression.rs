//! Suppression-list collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Result;

/// Why an address must no longer receive mail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuppressionKind {
    /// The recipient unsubscribed or complained
    Unsubscribed,
    /// Mail to the recipient bounced or failed permanently
    Bounced,
}

impl SuppressionKind {
    /// Numeric reason code used by do-not-contact stores
    pub fn code(&self) -> u8 {
        match self {
            Self::Unsubscribed => 1,
            Self::Bounced => 2,
        }
    }
}

/// Which record a suppression update applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum SuppressionTarget {
    /// Look the contact up by the opaque hash embedded in the send
    HashId {
        /// Hash prefix of the custom identifier
        hash: String,
        /// Address echoed in the custom identifier
        email: String,
    },
    /// Look the contact up by the address the provider reported
    Address {
        /// Recipient address
        address: String,
        /// Channel derived from the custom identifier, if one was sent
        channel_id: Option<i64>,
    },
}

/// A single suppression-list change derived from a delivery event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionUpdate {
    pub target: SuppressionTarget,
    pub kind: SuppressionKind,
    pub reason: String,
}

/// Storage for addresses that must not be mailed again.
///
/// Implementations own any locking or write contention handling.
#[async_trait]
pub trait SuppressionList: Send + Sync {
    /// Suppress the contact identified by a per-send hash
    async fn add_failure_by_hash_id(
        &self,
        hash: &str,
        reason: &str,
        kind: SuppressionKind,
    ) -> Result<()>;

    /// Suppress a raw recipient address
    async fn add_failure_by_address(
        &self,
        address: &str,
        reason: &str,
        kind: SuppressionKind,
        channel_id: Option<i64>,
    ) -> Result<()>;

    /// Route an update to the matching method
    async fn apply(&self, update: &SuppressionUpdate) -> Result<()> {
        match &update.target {
            SuppressionTarget::HashId { hash, .. } => {
                self.add_failure_by_hash_id(hash, &update.reason, update.kind)
                    .await
            }
            SuppressionTarget::Address {
                address,
                channel_id,
            } => {
                self.add_failure_by_address(address, &update.reason, update.kind, *channel_id)
                    .await
            }
        }
    }
}

#[async_trait]
impl<T: SuppressionList + ?Sized> SuppressionList for Arc<T> {
    async fn add_failure_by_hash_id(
        &self,
        hash: &str,
        reason: &str,
        kind: SuppressionKind,
    ) -> Result<()> {
        (**self).add_failure_by_hash_id(hash, reason, kind).await
    }

    async fn add_failure_by_address(
        &self,
        address: &str,
        reason: &str,
        kind: SuppressionKind,
        channel_id: Option<i64>,
    ) -> Result<()> {
        (**self)
            .add_failure_by_address(address, reason, kind, channel_id)
            .await
    }
}

/// A recorded call against [`InMemorySuppressionList`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressionRecord {
    HashId {
        hash: String,
        reason: String,
        kind: SuppressionKind,
    },
    Address {
        address: String,
        reason: String,
        kind: SuppressionKind,
        channel_id: Option<i64>,
    },
}

/// Suppression list that keeps every update in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySuppressionList {
    records: Arc<RwLock<Vec<SuppressionRecord>>>,
}

impl InMemorySuppressionList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded updates, oldest first
    pub async fn records(&self) -> Vec<SuppressionRecord> {
        self.records.read().await.clone()
    }

    /// Number of recorded updates
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing has been recorded
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Whether an address has been suppressed
    pub async fn is_suppressed(&self, address: &str) -> bool {
        self.records.read().await.iter().any(|record| match record {
            SuppressionRecord::Address { address: a, .. } => a.eq_ignore_ascii_case(address),
            SuppressionRecord::HashId { .. } => false,
        })
    }

    /// Forget every recorded update
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl SuppressionList for InMemorySuppressionList {
    async fn add_failure_by_hash_id(
        &self,
        hash: &str,
        reason: &str,
        kind: SuppressionKind,
    ) -> Result<()> {
        self.records.write().await.push(SuppressionRecord::HashId {
            hash: hash.to_string(),
            reason: reason.to_string(),
            kind,
        });
        Ok(())
    }

    async fn add_failure_by_address(
        &self,
        address: &str,
        reason: &str,
        kind: SuppressionKind,
        channel_id: Option<i64>,
    ) -> Result<()> {
        self.records.write().await.push(SuppressionRecord::Address {
            address: address.to_string(),
            reason: reason.to_string(),
            kind,
            channel_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_routes_by_target() {
        let list = InMemorySuppressionList::new();

        list.apply(&SuppressionUpdate {
            target: SuppressionTarget::HashId {
                hash: "abc123".to_string(),
                email: "a@x.com".to_string(),
            },
            kind: SuppressionKind::Bounced,
            reason: "mailbox full".to_string(),
        })
        .await
        .unwrap();

        list.apply(&SuppressionUpdate {
            target: SuppressionTarget::Address {
                address: "b@x.com".to_string(),
                channel_id: Some(7),
            },
            kind: SuppressionKind::Unsubscribed,
            reason: "User unsubscribed".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(
            list.records().await,
            vec![
                SuppressionRecord::HashId {
                    hash: "abc123".to_string(),
                    reason: "mailbox full".to_string(),
                    kind: SuppressionKind::Bounced,
                },
                SuppressionRecord::Address {
                    address: "b@x.com".to_string(),
                    reason: "User unsubscribed".to_string(),
                    kind: SuppressionKind::Unsubscribed,
                    channel_id: Some(7),
                },
            ]
        );
        assert!(list.is_suppressed("B@X.COM").await);
        assert!(!list.is_suppressed("a@x.com").await);
    }

    #[tokio::test]
    async fn test_clear() {
        let list = InMemorySuppressionList::new();
        list.add_failure_by_address("a@x.com", "bounce", SuppressionKind::Bounced, None)
            .await
            .unwrap();
        assert_eq!(list.len().await, 1);

        list.clear().await;
        assert!(list.is_empty().await);
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(SuppressionKind::Unsubscribed.code(), 1);
        assert_eq!(SuppressionKind::Bounced.code(), 2);
    }
}
