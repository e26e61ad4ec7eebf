//! Play Consumption
//!
//! Debits one play attempt from a caught-up account. Natural lives are spent
//! before purchased ones, and an active subscription short-circuits the
//! debit entirely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::account::LifeAccount;
use crate::engine::recalc::{recalculate, seconds_until_next_life};

/// Which pool a consumed life came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifePool {
    /// Regenerating pool.
    Natural,
    /// Purchased pool.
    Purchased,
}

/// Outcome of a consumption attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsumeOutcome {
    /// One life was debited from the given pool.
    Consumed {
        /// Pool the debit came from.
        pool: LifePool,
    },
    /// Subscription active: plays are unlimited, nothing was debited.
    Unlimited,
    /// Both pools empty: no play is available.
    Exhausted,
}

impl ConsumeOutcome {
    /// Did this attempt grant a play (debit or unlimited)?
    pub fn allows_play(&self) -> bool {
        !matches!(self, ConsumeOutcome::Exhausted)
    }
}

/// Result of [`consume`]: the post-debit account plus the outcome and the
/// refreshed next-life countdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumeResult {
    /// Account after recalculation and (possibly) one debit.
    pub account: LifeAccount,
    /// What happened.
    pub outcome: ConsumeOutcome,
    /// Seconds until the next natural life, recomputed after the debit.
    pub next_life_in_seconds: u64,
}

/// Attempt to consume one play at instant `now`.
///
/// Always recalculates first: consumption debits caught-up state, never
/// stale state. Pure like [`recalculate`]; the caller persists the result.
pub fn consume(account: LifeAccount, now: DateTime<Utc>) -> ConsumeResult {
    let recalculated = recalculate(account, now);
    let mut account = recalculated.account;

    if account.subscription_active {
        return ConsumeResult {
            account,
            outcome: ConsumeOutcome::Unlimited,
            next_life_in_seconds: 0,
        };
    }

    if account.natural_lives > 0 {
        let was_full = account.is_full();
        account.natural_lives -= 1;
        if was_full {
            // The newly vacated slot starts its countdown fresh. Without
            // this, the stale anchor would make the slot refill instantly.
            account.last_regen_at = Some(now);
        }
        let next_life_in_seconds = seconds_until_next_life(&account, now);
        return ConsumeResult {
            account,
            outcome: ConsumeOutcome::Consumed {
                pool: LifePool::Natural,
            },
            next_life_in_seconds,
        };
    }

    if account.bought_lives > 0 {
        account.bought_lives -= 1;
        return ConsumeResult {
            account,
            outcome: ConsumeOutcome::Consumed {
                pool: LifePool::Purchased,
            },
            next_life_in_seconds: recalculated.next_life_in_seconds,
        };
    }

    ConsumeResult {
        account,
        outcome: ConsumeOutcome::Exhausted,
        next_life_in_seconds: recalculated.next_life_in_seconds,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::date_of;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn settled_account(natural: u32, bought: u32, now: DateTime<Utc>) -> LifeAccount {
        LifeAccount {
            natural_lives: natural,
            bought_lives: bought,
            last_regen_at: Some(now),
            last_daily_bonus_date: Some(date_of(now)),
            ..LifeAccount::default()
        }
    }

    #[test]
    fn test_consume_prefers_natural_pool() {
        let now = noon();
        let account = settled_account(2, 5, now);

        let result = consume(account, now);

        assert_eq!(
            result.outcome,
            ConsumeOutcome::Consumed {
                pool: LifePool::Natural
            }
        );
        assert_eq!(result.account.natural_lives, 1);
        assert_eq!(result.account.bought_lives, 5);
    }

    #[test]
    fn test_consume_falls_back_to_purchased() {
        let now = noon();
        let account = settled_account(0, 2, now);

        let result = consume(account, now);

        assert_eq!(
            result.outcome,
            ConsumeOutcome::Consumed {
                pool: LifePool::Purchased
            }
        );
        assert_eq!(result.account.natural_lives, 0);
        assert_eq!(result.account.bought_lives, 1);
    }

    #[test]
    fn test_consume_exhausted_leaves_pools_unchanged() {
        let now = noon();
        let account = settled_account(0, 0, now);

        let result = consume(account.clone(), now);

        assert_eq!(result.outcome, ConsumeOutcome::Exhausted);
        assert!(!result.outcome.allows_play());
        assert_eq!(result.account.natural_lives, 0);
        assert_eq!(result.account.bought_lives, 0);
    }

    #[test]
    fn test_consume_reanchors_when_vacating_full_pool() {
        let now = noon();
        // Arbitrary stale anchor: the full pool masks it until a consume.
        let mut account = settled_account(3, 0, now);
        account.last_regen_at = Some(now - Duration::hours(8));

        let result = consume(account, now);

        assert_eq!(result.account.natural_lives, 2);
        assert_eq!(result.account.last_regen_at, Some(now));
        // Fresh countdown for the vacated slot, not an instant refill.
        assert_eq!(result.next_life_in_seconds, 30 * 60);
    }

    #[test]
    fn test_consume_below_full_keeps_running_countdown() {
        let now = noon();
        let mut account = settled_account(2, 0, now);
        account.last_regen_at = Some(now - Duration::minutes(10));

        let result = consume(account, now);

        assert_eq!(result.account.natural_lives, 1);
        // Pool was not full: the in-flight countdown keeps its anchor.
        assert_eq!(result.account.last_regen_at, Some(now - Duration::minutes(10)));
        assert_eq!(result.next_life_in_seconds, 20 * 60);
    }

    #[test]
    fn test_consume_unlimited_with_subscription() {
        let now = noon();
        let mut account = settled_account(0, 0, now);
        account.subscription_active = true;

        let result = consume(account, now);

        assert_eq!(result.outcome, ConsumeOutcome::Unlimited);
        assert!(result.outcome.allows_play());
        assert_eq!(result.account.natural_lives, result.account.max_natural_lives);
        assert_eq!(result.next_life_in_seconds, 0);
    }

    #[test]
    fn test_consume_debits_caught_up_state() {
        let now = noon();
        // Empty on disk, but 35 minutes have passed: one life regenerated,
        // and that one is consumed.
        let mut account = settled_account(0, 0, now);
        account.last_regen_at = Some(now - Duration::minutes(35));

        let result = consume(account, now);

        assert_eq!(
            result.outcome,
            ConsumeOutcome::Consumed {
                pool: LifePool::Natural
            }
        );
        assert_eq!(result.account.natural_lives, 0);
        // 5 minutes into the next interval, 25 to go.
        assert_eq!(result.next_life_in_seconds, 25 * 60);
    }

    #[test]
    fn test_outcome_serde_shape() {
        let json = serde_json::to_string(&ConsumeOutcome::Consumed {
            pool: LifePool::Purchased,
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"consumed","pool":"purchased"}"#);
    }

    proptest! {
        #[test]
        fn prop_consume_never_goes_negative(
            natural in 0u32..10,
            bought in 0u32..10,
            offset_minutes in 0i64..600,
        ) {
            let now = noon();
            let mut account = settled_account(natural.min(3), bought, now);
            account.last_regen_at = Some(now - Duration::minutes(offset_minutes));

            let result = consume(account, now);

            prop_assert!(result.account.natural_lives <= result.account.max_natural_lives);
            // u32 pools cannot underflow, and Exhausted must mean both empty.
            if result.outcome == ConsumeOutcome::Exhausted {
                prop_assert_eq!(result.account.total_lives(), 0);
            }
        }
    }
}
