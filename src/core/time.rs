//! Interval and Calendar-Day Arithmetic
//!
//! Pure helpers for the lives regeneration timer. All math is UTC-only and
//! saturating: a clock that appears to run backwards never produces negative
//! elapsed time, and a missing anchor means "no time has passed yet."

use chrono::{DateTime, NaiveDate, Utc};

/// Seconds per regeneration interval of the given minute length.
#[inline]
pub fn interval_seconds(interval_minutes: u32) -> u64 {
    u64::from(interval_minutes) * 60
}

/// Whole seconds from `earlier` to `later`, saturating at zero.
#[inline]
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> u64 {
    let delta = later.signed_duration_since(earlier).num_seconds();
    u64::try_from(delta).unwrap_or(0)
}

/// Number of complete regeneration intervals elapsed between the anchor and `now`.
///
/// A `None` anchor is treated as "no time has passed yet": the caller is
/// expected to initialize the anchor to `now` rather than receive a huge
/// elapsed duration (which would grant a flood of lives on first use).
/// A zero-length interval also yields zero, never a division by zero.
pub fn whole_intervals_elapsed(
    anchor: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval_minutes: u32,
) -> u64 {
    let Some(anchor) = anchor else {
        return 0;
    };
    let interval = interval_seconds(interval_minutes);
    if interval == 0 {
        return 0;
    }
    seconds_between(anchor, now) / interval
}

/// UTC calendar date of an instant.
///
/// Used for the daily-bonus comparison; local timezones would make the bonus
/// day boundary drift per client, so everything stays in UTC.
#[inline]
pub fn date_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}
