//! Service Layer
//!
//! Non-deterministic orchestration rim: wires the pure engine to the record
//! gateway with optimistic-concurrency writes. The HTTP glue above this
//! crate calls these operations and does nothing but parameter passing.

pub mod lives;

pub use lives::{AccountView, LivesError, LivesService, ServiceConfig};
