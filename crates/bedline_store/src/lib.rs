//! # Bedline Store
//!
//! Persistence adapter for the bedline allocation engine.
//!
//! The store is the only component that reads or writes slot occupancy and
//! assignment records. Everything that touches more than one row runs
//! atomically, and occupancy changes only happen inside a
//! [`SlotTransaction`] that holds the target slot's lock.
//!
//! ## Design Principles
//!
//! - Uniqueness constraints are checked at commit time and are the final
//!   arbiter of races, not the engine's pre-checks
//! - Lock waits are bounded; a timeout is a retryable error
//! - The slot's occupancy and its active assignment record change together
//!   through one write path
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - tables in memory, persisted via [`StoreSnapshot`]

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod lock;
mod memory;
mod snapshot;
mod store;
mod tables;

pub use config::StoreConfig;
pub use error::{Constraint, StoreError, StoreResult};
pub use memory::{InMemoryStore, MemorySlotTransaction};
pub use snapshot::{StoreSnapshot, SNAPSHOT_VERSION};
pub use store::{CapacityCount, OccupancyStore, RoomFilter, SlotTransaction};
