//! In-Memory Record Store
//!
//! Reference [`UserRecordGateway`] backed by a `BTreeMap` behind a tokio
//! `RwLock`. The version check in `patch` runs under the write lock, which
//! gives the atomic check-and-apply the gateway contract requires. Used by
//! the service tests and the demo binary; production deployments plug a real
//! store in behind the same trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::engine::account::{LifeAccount, UserId};
use crate::store::gateway::{AccountPatch, GatewayError, UserRecordGateway, VersionedAccount};

/// One stored user record.
#[derive(Clone, Debug)]
struct StoredRecord {
    account: LifeAccount,
    last_active_at: Option<DateTime<Utc>>,
    version: u64,
}

/// In-memory, versioned record store.
#[derive(Default)]
pub struct MemoryGateway {
    records: RwLock<BTreeMap<UserId, StoredRecord>>,
}

impl MemoryGateway {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Service-maintained activity timestamp for a user, if recorded.
    pub async fn last_active_at(&self, user: &UserId) -> Option<DateTime<Utc>> {
        self.records
            .read()
            .await
            .get(user)
            .and_then(|r| r.last_active_at)
    }
}

#[async_trait]
impl UserRecordGateway for MemoryGateway {
    async fn fetch(&self, user: &UserId) -> Result<Option<VersionedAccount>, GatewayError> {
        let records = self.records.read().await;
        Ok(records.get(user).map(|r| VersionedAccount {
            account: r.account.clone(),
            version: r.version,
        }))
    }

    async fn insert(&self, user: &UserId, account: LifeAccount) -> Result<bool, GatewayError> {
        let mut records = self.records.write().await;
        if records.contains_key(user) {
            return Ok(false);
        }
        records.insert(
            *user,
            StoredRecord {
                account,
                last_active_at: None,
                version: 1,
            },
        );
        Ok(true)
    }

    async fn patch(
        &self,
        user: &UserId,
        patch: AccountPatch,
        expected_version: u64,
    ) -> Result<u64, GatewayError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(user).ok_or(GatewayError::NotFound)?;

        if record.version != expected_version {
            return Err(GatewayError::VersionConflict);
        }

        patch.apply(&mut record.account);
        if let Some(at) = patch.last_active_at {
            record.last_active_at = Some(at);
        }
        record.version += 1;
        Ok(record.version)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(n: u8) -> UserId {
        UserId::new([n; 16])
    }

    #[tokio::test]
    async fn test_fetch_missing_is_none() {
        let store = MemoryGateway::new();
        assert_eq!(store.fetch(&user(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_then_fetch() {
        let store = MemoryGateway::new();
        let created = store.insert(&user(1), LifeAccount::default()).await.unwrap();
        assert!(created);

        let stored = store.fetch(&user(1)).await.unwrap().unwrap();
        assert_eq!(stored.account, LifeAccount::default());
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_insert_is_first_write_wins() {
        let store = MemoryGateway::new();
        store.insert(&user(1), LifeAccount::default()).await.unwrap();

        let mut other = LifeAccount::default();
        other.bought_lives = 42;
        let created = store.insert(&user(1), other).await.unwrap();

        assert!(!created);
        let stored = store.fetch(&user(1)).await.unwrap().unwrap();
        assert_eq!(stored.account.bought_lives, 0);
    }

    #[tokio::test]
    async fn test_patch_bumps_version() {
        let store = MemoryGateway::new();
        store.insert(&user(1), LifeAccount::default()).await.unwrap();

        let patch = AccountPatch {
            bought_lives: Some(10),
            ..AccountPatch::default()
        };
        let new_version = store.patch(&user(1), patch, 1).await.unwrap();

        assert_eq!(new_version, 2);
        let stored = store.fetch(&user(1)).await.unwrap().unwrap();
        assert_eq!(stored.account.bought_lives, 10);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_patch_stale_version_conflicts() {
        let store = MemoryGateway::new();
        store.insert(&user(1), LifeAccount::default()).await.unwrap();

        let patch = AccountPatch {
            bought_lives: Some(10),
            ..AccountPatch::default()
        };
        store.patch(&user(1), patch.clone(), 1).await.unwrap();

        // Second writer still holds version 1: must not silently overwrite.
        let result = store.patch(&user(1), patch, 1).await;
        assert_eq!(result, Err(GatewayError::VersionConflict));

        let stored = store.fetch(&user(1)).await.unwrap().unwrap();
        assert_eq!(stored.account.bought_lives, 10);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_patch_missing_record() {
        let store = MemoryGateway::new();
        let result = store.patch(&user(9), AccountPatch::default(), 1).await;
        assert_eq!(result, Err(GatewayError::NotFound));
    }

    #[tokio::test]
    async fn test_patch_records_activity() {
        let store = MemoryGateway::new();
        store.insert(&user(1), LifeAccount::default()).await.unwrap();
        assert_eq!(store.last_active_at(&user(1)).await, None);

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let patch = AccountPatch::default().with_activity(now);
        store.patch(&user(1), patch, 1).await.unwrap();

        assert_eq!(store.last_active_at(&user(1)).await, Some(now));
    }
}
