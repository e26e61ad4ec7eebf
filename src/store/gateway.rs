//! User Record Gateway
//!
//! The engine's only storage requirement: get-by-id and patch-by-id against
//! an external record store. The trait is async because every real store is
//! I/O; the engine itself never blocks.
//!
//! ## Concurrency contract
//!
//! The fetch → recalculate/consume → patch cycle is not atomic. Two
//! concurrent consumes for the same user can both read the same pre-debit
//! state and both decrement, losing one debit. Every fetched record
//! therefore carries a version, and `patch` applies only when the stored
//! version still matches; implementations must check-and-apply atomically.
//! Callers retry the whole cycle on [`GatewayError::VersionConflict`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::account::{LifeAccount, UserId};

/// A fetched account together with its store version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedAccount {
    /// The stored life account.
    pub account: LifeAccount,
    /// Monotonically increasing version, bumped on every applied patch.
    pub version: u64,
}

/// Partial update of a user record.
///
/// Only the fields the engine or service actually changed are written;
/// `None` fields are left untouched in the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    /// New natural-pool count.
    pub natural_lives: Option<u32>,
    /// New purchased-pool count.
    pub bought_lives: Option<u32>,
    /// New regeneration anchor.
    pub last_regen_at: Option<DateTime<Utc>>,
    /// New daily-bonus date stamp.
    pub last_daily_bonus_date: Option<NaiveDate>,
    /// New subscription flag (only the subscription operation sets this).
    pub subscription_active: Option<bool>,
    /// Activity timestamp, maintained by the service on every write.
    pub last_active_at: Option<DateTime<Utc>>,
}

impl AccountPatch {
    /// Build a patch containing exactly the fields that differ between the
    /// fetched account and the recomputed one.
    pub fn diff(before: &LifeAccount, after: &LifeAccount) -> Self {
        Self {
            natural_lives: (before.natural_lives != after.natural_lives)
                .then_some(after.natural_lives),
            bought_lives: (before.bought_lives != after.bought_lives)
                .then_some(after.bought_lives),
            last_regen_at: (before.last_regen_at != after.last_regen_at)
                .then(|| after.last_regen_at)
                .flatten(),
            last_daily_bonus_date: (before.last_daily_bonus_date != after.last_daily_bonus_date)
                .then(|| after.last_daily_bonus_date)
                .flatten(),
            subscription_active: (before.subscription_active != after.subscription_active)
                .then_some(after.subscription_active),
            last_active_at: None,
        }
    }

    /// Stamp the service-maintained activity timestamp onto this patch.
    pub fn with_activity(mut self, now: DateTime<Utc>) -> Self {
        self.last_active_at = Some(now);
        self
    }

    /// Does this patch change any account field (activity aside)?
    pub fn changes_account(&self) -> bool {
        self.natural_lives.is_some()
            || self.bought_lives.is_some()
            || self.last_regen_at.is_some()
            || self.last_daily_bonus_date.is_some()
            || self.subscription_active.is_some()
    }

    /// Apply the patched fields to an account in place.
    pub fn apply(&self, account: &mut LifeAccount) {
        if let Some(v) = self.natural_lives {
            account.natural_lives = v;
        }
        if let Some(v) = self.bought_lives {
            account.bought_lives = v;
        }
        if let Some(v) = self.last_regen_at {
            account.last_regen_at = Some(v);
        }
        if let Some(v) = self.last_daily_bonus_date {
            account.last_daily_bonus_date = Some(v);
        }
        if let Some(v) = self.subscription_active {
            account.subscription_active = v;
        }
    }
}

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No record exists for the user.
    #[error("record not found")]
    NotFound,

    /// The stored version no longer matches the caller's snapshot.
    #[error("version conflict: record changed since fetch")]
    VersionConflict,

    /// The store itself failed; transient, retryable by the caller.
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Async boundary to the external record store.
#[async_trait]
pub trait UserRecordGateway: Send + Sync {
    /// Fetch a user's account. `Ok(None)` means "no such record", which is
    /// distinct from "record exists with default values".
    async fn fetch(&self, user: &UserId) -> Result<Option<VersionedAccount>, GatewayError>;

    /// Create the record if absent. Returns `true` when a record was
    /// created, `false` when one already existed (first write wins).
    async fn insert(&self, user: &UserId, account: LifeAccount) -> Result<bool, GatewayError>;

    /// Apply a partial update if the stored version equals
    /// `expected_version`, returning the new version. Fails with
    /// [`GatewayError::VersionConflict`] when another writer got there
    /// first, and [`GatewayError::NotFound`] when the record is missing.
    async fn patch(
        &self,
        user: &UserId,
        patch: AccountPatch,
        expected_version: u64,
    ) -> Result<u64, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_diff_empty_for_identical_accounts() {
        let account = LifeAccount::default();
        let patch = AccountPatch::diff(&account, &account.clone());
        assert_eq!(patch, AccountPatch::default());
        assert!(!patch.changes_account());
    }

    #[test]
    fn test_diff_captures_only_changed_fields() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let before = LifeAccount::default();
        let mut after = before.clone();
        after.natural_lives = 1;
        after.last_regen_at = Some(now);

        let patch = AccountPatch::diff(&before, &after);

        assert_eq!(patch.natural_lives, Some(1));
        assert_eq!(patch.last_regen_at, Some(now));
        assert_eq!(patch.bought_lives, None);
        assert_eq!(patch.subscription_active, None);
        assert!(patch.changes_account());
    }

    #[test]
    fn test_diff_then_apply_round_trips() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let before = LifeAccount::default();
        let mut after = before.clone();
        after.natural_lives = 2;
        after.bought_lives = 9;
        after.last_regen_at = Some(now);
        after.last_daily_bonus_date = Some(now.date_naive());
        after.subscription_active = true;

        let patch = AccountPatch::diff(&before, &after);
        let mut patched = before.clone();
        patch.apply(&mut patched);

        assert_eq!(patched, after);
    }
}
