//! Lives Engine
//!
//! The pure, deterministic heart of the economy layer. Everything in this
//! module is a total function of (account state, injected `now`): no ambient
//! clock, no I/O, no shared mutable state. That makes the engine trivially
//! safe to call from any number of tasks and deterministic under test.
//!
//! ## Module Structure
//!
//! - `account`: user identifier and per-user life state
//! - `recalc`: lazy catch-up recomputation (regeneration + daily bonus)
//! - `consume`: play-attempt debit with pool preference

pub mod account;
pub mod consume;
pub mod recalc;

// Re-export key types
pub use account::{LifeAccount, UserId};
pub use consume::{consume, ConsumeOutcome, ConsumeResult, LifePool};
pub use recalc::{recalculate, seconds_until_next_life, Recalculated};
