//! Storage Layer
//!
//! Boundary to the external user record store. This layer is
//! **non-deterministic** (I/O, locking); all economy logic lives in
//! `engine/` and only passes through here.

pub mod gateway;
pub mod memory;

pub use gateway::{AccountPatch, GatewayError, UserRecordGateway, VersionedAccount};
pub use memory::MemoryGateway;
