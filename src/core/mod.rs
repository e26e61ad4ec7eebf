//! Core deterministic primitives.
//!
//! Pure time arithmetic with no side effects and no ambient clock.
//! Everything above this layer injects `now` explicitly.

pub mod time;

// Re-export core helpers
pub use time::{date_of, interval_seconds, seconds_between, whole_intervals_elapsed};
