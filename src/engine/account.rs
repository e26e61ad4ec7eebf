//! Life Account State
//!
//! The per-user economy record: natural (regenerating) lives, purchased
//! lives, the regeneration anchor, and the daily-bonus bookkeeping.
//! Owned exclusively by the record store; the engine receives it by value,
//! transforms it, and hands it back for persistence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MAX_NATURAL_LIVES, DEFAULT_REGEN_INTERVAL_MINUTES};

// =============================================================================
// USER ID
// =============================================================================

/// Unique user identifier (UUID as bytes).
///
/// Implements Ord so record stores can key on it deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct UserId(pub [u8; 16]);

impl UserId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create a fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// =============================================================================
// LIFE ACCOUNT
// =============================================================================

/// Life-related state for a single user.
///
/// Invariants maintained by the engine (`engine::recalc`, `engine::consume`):
///
/// - `natural_lives <= max_natural_lives` after every recalculation
/// - `last_regen_at` only advances in whole-interval steps or is re-anchored
///   to "now"; it never regresses
/// - `last_daily_bonus_date`, once stamped with a UTC date, blocks a second
///   bonus on that date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeAccount {
    /// Regenerating lives, capped at `max_natural_lives`.
    pub natural_lives: u32,

    /// Cap for the natural pool (per-account configurable).
    pub max_natural_lives: u32,

    /// Length of one regeneration tick in minutes.
    pub regen_interval_minutes: u32,

    /// Instant from which undelivered regeneration intervals are measured.
    /// `None` means the timer has never been anchored (fresh account).
    pub last_regen_at: Option<DateTime<Utc>>,

    /// Last UTC date the daily bonus was granted, `None` if never.
    pub last_daily_bonus_date: Option<NaiveDate>,

    /// Purchased lives. Uncapped, untouched by regeneration and the bonus.
    pub bought_lives: u32,

    /// Externally owned subscription flag. The engine only reads it; while
    /// set, the natural-life mechanism is suspended (unlimited plays).
    pub subscription_active: bool,
}

impl LifeAccount {
    /// Create a fresh account with a full natural pool and no timer anchor.
    pub fn new(max_natural_lives: u32, regen_interval_minutes: u32) -> Self {
        Self {
            natural_lives: max_natural_lives,
            max_natural_lives,
            regen_interval_minutes,
            last_regen_at: None,
            last_daily_bonus_date: None,
            bought_lives: 0,
            subscription_active: false,
        }
    }

    /// Length of one regeneration tick in seconds.
    #[inline]
    pub fn regen_interval_seconds(&self) -> u64 {
        crate::core::time::interval_seconds(self.regen_interval_minutes)
    }

    /// Is the natural pool at its cap?
    #[inline]
    pub fn is_full(&self) -> bool {
        self.natural_lives >= self.max_natural_lives
    }

    /// Total playable lives across both pools.
    pub fn total_lives(&self) -> u64 {
        u64::from(self.natural_lives) + u64::from(self.bought_lives)
    }

    /// Clamp malformed fields to safe values.
    ///
    /// The pure engine functions are total: stored records with a zero cap,
    /// zero interval, or an over-cap natural pool are repaired here rather
    /// than rejected.
    pub(crate) fn normalize(&mut self) {
        if self.max_natural_lives == 0 {
            self.max_natural_lives = DEFAULT_MAX_NATURAL_LIVES;
        }
        if self.regen_interval_minutes == 0 {
            self.regen_interval_minutes = DEFAULT_REGEN_INTERVAL_MINUTES;
        }
        if self.natural_lives > self.max_natural_lives {
            self.natural_lives = self.max_natural_lives;
        }
    }
}

impl Default for LifeAccount {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NATURAL_LIVES, DEFAULT_REGEN_INTERVAL_MINUTES)
    }
}

// =============================================================================
// TESTS
// =============================================================================
