//! # Bedline Core
//!
//! The bed allocation engine.
//!
//! This crate provides:
//! - [`AllocationEngine`] - assign, release and auto-assign occupants,
//!   generate capacity, manage rooms
//! - [`CapacityReport`] - read-only projections for dashboards and lists
//! - [`BeneficiaryDirectory`] - the collaborator that knows who occupants are
//! - [`AllocError`] - typed rule violations with HTTP-style status classes
//!
//! ## Guarantees
//!
//! - A slot has at most one occupant, and its state always agrees with its
//!   active assignment record
//! - An occupant holds at most one slot across the whole shelter
//! - Concurrent requests on the same slot serialize on the slot's lock;
//!   exactly one wins and the rest see a conflict
//! - Lost races are reported, never silently retried (auto-assign re-picks
//!   a slot a bounded number of times)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bedline_core::{AllocationEngine, Caller, InMemoryDirectory, Occupant};
//! use bedline_model::{OccupantId, RoomSpec, Sex};
//! use bedline_store::InMemoryStore;
//!
//! let directory = InMemoryDirectory::from_occupants([
//!     Occupant::new(OccupantId::new(1), Sex::Male).with_name("Luis", "Pardo"),
//! ]);
//! let engine = AllocationEngine::new(Arc::new(InMemoryStore::new()), Arc::new(directory));
//!
//! let room = engine.create_room(RoomSpec::new("H-101", Sex::Male, Some(1))).unwrap();
//! engine.generate_capacity(room.id, 2).unwrap();
//!
//! let slot = engine.auto_assign(&Caller::staff("maria"), OccupantId::new(1)).unwrap();
//! assert_eq!(slot.code, "H-101-L1-C1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod caller;
mod config;
mod directory;
mod engine;
mod error;
mod report;

pub use caller::Caller;
pub use config::EngineConfig;
pub use directory::{BeneficiaryDirectory, InMemoryDirectory, Occupant, OccupantQuery};
pub use engine::{AllocationEngine, GeneratedCapacity};
pub use error::{AllocError, AllocResult, ErrorKind};
pub use report::{BunkSummary, CapacityReport, OccupantSummary, RoomSummary, SlotView};
