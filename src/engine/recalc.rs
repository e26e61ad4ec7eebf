//! Lives Recalculation
//!
//! The core state transition that must be pure and idempotent.
//! Every read-or-consume request replays elapsed time's effects against the
//! freshly fetched account, as if regeneration and the daily bonus had been
//! ticking continuously in the background. No background timer exists; this
//! function IS the timer, evaluated lazily on access.

use chrono::{DateTime, Duration, Utc};

use crate::core::time::{date_of, seconds_between, whole_intervals_elapsed};
use crate::engine::account::LifeAccount;

/// A caught-up account plus the derived countdown to the next natural life.
///
/// `next_life_in_seconds` is never persisted; it is recomputed on every call
/// and must not be trusted from storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recalculated {
    /// The caught-up account, ready to be persisted by the caller.
    pub account: LifeAccount,
    /// Seconds until the next natural life is granted (0 when the pool is
    /// full or a subscription is active).
    pub next_life_in_seconds: u64,
}

/// Replay elapsed time's effects on an account at instant `now`.
///
/// Pure and total: malformed inputs are normalized, never rejected, and
/// `now` is always injected (no ambient clock). Calling twice with the same
/// `now` is a no-op the second time.
///
/// Step order is load-bearing:
///
/// 1. Subscription short-circuit (subscription state is authoritative and
///    re-anchors the timer every call so it cannot drift while unused)
/// 2. Default anchor for first observation (no catch-up flood)
/// 3. Interval regeneration catch-up, anchor advanced in whole-interval
///    steps so the remainder keeps counting down
/// 4. Daily bonus, at most once per UTC date
/// 5. Projection, with a cap-reset re-anchor when the pool is full
pub fn recalculate(account: LifeAccount, now: DateTime<Utc>) -> Recalculated {
    let mut account = account;
    account.normalize();
    let today = date_of(now);

    // 1. Subscription overrides the whole mechanism.
    if account.subscription_active {
        account.natural_lives = account.max_natural_lives;
        account.last_regen_at = Some(now);
        account.last_daily_bonus_date = Some(today);
        return Recalculated {
            account,
            next_life_in_seconds: 0,
        };
    }

    // 2. First observation: anchor the timer, grant nothing.
    if account.last_regen_at.is_none() {
        account.last_regen_at = Some(now);
    }

    // 3. Deliver every complete interval since the anchor.
    if !account.is_full() {
        let n = whole_intervals_elapsed(account.last_regen_at, now, account.regen_interval_minutes);
        if n > 0 {
            let missing = u64::from(account.max_natural_lives - account.natural_lives);
            if n >= missing {
                account.natural_lives = account.max_natural_lives;
            } else {
                account.natural_lives += n as u32;
            }
            // Advance by whole intervals only, NOT snapped to `now`: the
            // partial interval since the last delivered life keeps counting.
            let step = Duration::seconds((n * account.regen_interval_seconds()) as i64);
            account.last_regen_at = account.last_regen_at.map(|anchor| anchor + step);
        }
    }

    // 4. Daily bonus. The date is stamped even when the pool was already
    // full: the bonus is "used" for the day regardless.
    if account.last_daily_bonus_date.is_none_or(|d| d < today) {
        if !account.is_full() {
            account.natural_lives += 1;
        }
        account.last_daily_bonus_date = Some(today);
    }

    // 5. Projection. A full pool re-anchors to `now` so that a later
    // consumption starts its countdown fresh instead of from a stale,
    // already-expired anchor.
    let next_life_in_seconds = if account.is_full() {
        account.last_regen_at = Some(now);
        0
    } else {
        seconds_until_next_life(&account, now)
    };

    Recalculated {
        account,
        next_life_in_seconds,
    }
}

/// Countdown to the next natural life for an already caught-up account.
///
/// Zero when a subscription is active or the pool is full.
pub fn seconds_until_next_life(account: &LifeAccount, now: DateTime<Utc>) -> u64 {
    if account.subscription_active || account.is_full() {
        return 0;
    }
    let anchor = account.last_regen_at.unwrap_or(now);
    account
        .regen_interval_seconds()
        .saturating_sub(seconds_between(anchor, now))
}

// =============================================================================
// TESTS
// =============================================================================
