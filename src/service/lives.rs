//! Lives Service
//!
//! Orchestrates the pure engine against the record store: fetch the account,
//! run the recalculation or consumption, persist the caught-up fields.
//! Writes are optimistic: every patch is conditional on the version read at
//! fetch time and the whole cycle retries on conflict, so concurrent
//! requests for the same user never lose a debit or a grant.
//!
//! `now` is always injected by the caller; the service never reads an
//! ambient clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::engine::account::{LifeAccount, UserId};
use crate::engine::consume::{consume, ConsumeOutcome};
use crate::engine::recalc::{recalculate, seconds_until_next_life};
use crate::store::gateway::{AccountPatch, GatewayError, UserRecordGateway};

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Natural-pool cap for newly created accounts.
    pub default_max_natural_lives: u32,
    /// Regeneration interval for newly created accounts (minutes).
    pub default_regen_interval_minutes: u32,
    /// How many fetch/compute/patch cycles to attempt before giving up on a
    /// contended record.
    pub max_write_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_max_natural_lives: crate::DEFAULT_MAX_NATURAL_LIVES,
            default_regen_interval_minutes: crate::DEFAULT_REGEN_INTERVAL_MINUTES,
            max_write_attempts: 4,
        }
    }
}

/// Projected account state returned to callers.
///
/// `next_life_in_seconds` is derived at call time and never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    /// Regenerating lives currently available.
    pub natural_lives: u32,
    /// Purchased lives currently available.
    pub bought_lives: u32,
    /// Cap of the natural pool.
    pub max_natural_lives: u32,
    /// Whether an active subscription grants unlimited plays.
    pub subscription_active: bool,
    /// Seconds until the next natural life is granted.
    pub next_life_in_seconds: u64,
}

impl AccountView {
    fn project(account: &LifeAccount, next_life_in_seconds: u64) -> Self {
        Self {
            natural_lives: account.natural_lives,
            bought_lives: account.bought_lives,
            max_natural_lives: account.max_natural_lives,
            subscription_active: account.subscription_active,
            next_life_in_seconds,
        }
    }
}

/// Service errors.
#[derive(Debug, Error)]
pub enum LivesError {
    /// No account exists for the user; not retried, surfaced to the caller.
    #[error("account not found")]
    AccountNotFound,

    /// Optimistic writes kept conflicting; the caller may retry.
    #[error("write contention: gave up after {attempts} attempts")]
    Contention {
        /// Number of fetch/compute/patch cycles attempted.
        attempts: u32,
    },

    /// The record store failed; transient, never silently swallowed.
    #[error("gateway failure: {0}")]
    Gateway(#[from] GatewayError),
}

/// The lives economy service.
pub struct LivesService {
    gateway: Arc<dyn UserRecordGateway>,
    config: ServiceConfig,
}

impl LivesService {
    /// Create a new service over a record gateway.
    pub fn new(gateway: Arc<dyn UserRecordGateway>, config: ServiceConfig) -> Self {
        Self { gateway, config }
    }

    fn default_account(&self) -> LifeAccount {
        LifeAccount::new(
            self.config.default_max_natural_lives,
            self.config.default_regen_interval_minutes,
        )
    }

    /// Create the user's account with configured defaults if absent, then
    /// return its caught-up projection. Safe to call repeatedly.
    #[instrument(skip(self, now))]
    pub async fn init_account(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<AccountView, LivesError> {
        let created = self.gateway.insert(user, self.default_account()).await?;
        if created {
            info!("account {} created", short_id(user));
        }
        self.read_account(user, now).await
    }

    /// Catch the account up to `now`, persist the caught-up fields, and
    /// return the projection including the next-life countdown.
    #[instrument(skip(self, now))]
    pub async fn read_account(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<AccountView, LivesError> {
        self.write_through(user, now, |account| {
            let result = recalculate(account, now);
            let view = AccountView::project(&result.account, result.next_life_in_seconds);
            (result.account, view)
        })
        .await
    }

    /// Consume one play attempt from caught-up state. `Exhausted` is a
    /// normal business outcome, not an error.
    #[instrument(skip(self, now))]
    pub async fn consume_play(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(AccountView, ConsumeOutcome), LivesError> {
        let (view, outcome) = self
            .write_through(user, now, |account| {
                let result = consume(account, now);
                let view = AccountView::project(&result.account, result.next_life_in_seconds);
                (result.account, (view, result.outcome))
            })
            .await?;

        debug!(
            "consume for {}: {:?}, {} natural / {} bought left",
            short_id(user),
            outcome,
            view.natural_lives,
            view.bought_lives,
        );
        Ok((view, outcome))
    }

    /// Add purchased lives, bypassing the engine. The engine reconciles the
    /// rest of the account on the next recalculation.
    #[instrument(skip(self, now))]
    pub async fn grant_lives(
        &self,
        user: &UserId,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<AccountView, LivesError> {
        let view = self
            .write_through(user, now, |mut account| {
                account.bought_lives = account.bought_lives.saturating_add(count);
                let next = seconds_until_next_life(&account, now);
                let view = AccountView::project(&account, next);
                (account, view)
            })
            .await?;

        info!(
            "granted {} lives to {}: {} bought total",
            count,
            short_id(user),
            view.bought_lives
        );
        Ok(view)
    }

    /// Toggle the externally owned subscription flag, bypassing the engine.
    #[instrument(skip(self, now))]
    pub async fn set_subscription(
        &self,
        user: &UserId,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<AccountView, LivesError> {
        let view = self
            .write_through(user, now, |mut account| {
                account.subscription_active = active;
                let next = seconds_until_next_life(&account, now);
                let view = AccountView::project(&account, next);
                (account, view)
            })
            .await?;

        info!("subscription for {} set to {}", short_id(user), active);
        Ok(view)
    }

    /// Reset the pools to a fresh full state: natural pool back at its cap,
    /// purchased pool cleared, timer re-anchored. The daily-bonus stamp is
    /// preserved, so a reset never re-opens today's bonus.
    #[instrument(skip(self, now))]
    pub async fn reset_account(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<AccountView, LivesError> {
        let view = self
            .write_through(user, now, |mut account| {
                account.natural_lives = account.max_natural_lives;
                account.bought_lives = 0;
                account.last_regen_at = Some(now);
                let view = AccountView::project(&account, 0);
                (account, view)
            })
            .await?;

        info!("account {} reset", short_id(user));
        Ok(view)
    }

    /// One optimistic read-modify-write cycle, retried on version conflict.
    ///
    /// `step` must be pure in the account it is given: it is re-run against
    /// a fresh fetch after every conflict.
    async fn write_through<F, T>(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
        mut step: F,
    ) -> Result<T, LivesError>
    where
        F: FnMut(LifeAccount) -> (LifeAccount, T),
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let stored = self
                .gateway
                .fetch(user)
                .await?
                .ok_or(LivesError::AccountNotFound)?;

            let before = stored.account.clone();
            let (after, output) = step(stored.account);
            let patch = AccountPatch::diff(&before, &after).with_activity(now);

            match self.gateway.patch(user, patch, stored.version).await {
                Ok(_) => return Ok(output),
                Err(GatewayError::VersionConflict) if attempts < self.config.max_write_attempts => {
                    debug!(
                        "version conflict for {} (attempt {}), retrying",
                        short_id(user),
                        attempts
                    );
                }
                Err(GatewayError::VersionConflict) => {
                    warn!(
                        "giving up on {} after {} contended attempts",
                        short_id(user),
                        attempts
                    );
                    return Err(LivesError::Contention { attempts });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Short hex prefix of a user id for log lines.
fn short_id(user: &UserId) -> String {
    hex::encode(&user.as_bytes()[..4])
}

// =============================================================================
// TESTS
// =============================================================================
