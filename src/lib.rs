//! # Pytha Lives Server
//!
//! Lives economy engine for the Pytha game backend: tracks play attempts,
//! replenishes them over wall-clock time, grants a once-per-day bonus life,
//! and lets an active subscription override the mechanism entirely.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PYTHA LIVES SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── time.rs     - Interval and UTC calendar-day math        │
//! │                                                              │
//! │  engine/         - Economy logic (pure, deterministic)       │
//! │  ├── account.rs  - User id and per-user life state           │
//! │  ├── recalc.rs   - Lazy catch-up recomputation               │
//! │  └── consume.rs  - Play-attempt debit, pool preference       │
//! │                                                              │
//! │  store/          - Record store boundary (non-deterministic) │
//! │  ├── gateway.rs  - Versioned fetch/insert/patch trait        │
//! │  └── memory.rs   - In-memory reference implementation        │
//! │                                                              │
//! │  service/        - Orchestration (non-deterministic)         │
//! │  └── lives.rs    - Fetch → engine → conditional patch        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `engine/` modules are **100% deterministic**:
//! - `now` is always an injected parameter, never an ambient clock
//! - No I/O and no shared mutable state
//! - All calendar math in UTC
//!
//! Given the same stored account and the same instant, recalculation and
//! consumption produce identical results on every call, which is what
//! makes the lazy catch-up model safe to run on every read.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod engine;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use engine::account::{LifeAccount, UserId};
pub use engine::consume::{consume, ConsumeOutcome, ConsumeResult, LifePool};
pub use engine::recalc::{recalculate, Recalculated};
pub use service::lives::{AccountView, LivesError, LivesService, ServiceConfig};
pub use store::gateway::{AccountPatch, GatewayError, UserRecordGateway, VersionedAccount};
pub use store::memory::MemoryGateway;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Natural-life cap for accounts that don't configure their own
pub const DEFAULT_MAX_NATURAL_LIVES: u32 = 3;

/// Regeneration interval (minutes) for accounts that don't configure their own
pub const DEFAULT_REGEN_INTERVAL_MINUTES: u32 = 30;
