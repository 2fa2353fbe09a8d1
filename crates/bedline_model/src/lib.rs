//! # Bedline Model
//!
//! Static shape of a shelter's sleeping capacity.
//!
//! This crate provides:
//! - Identifiers for rooms, slots, occupants and assignment records
//! - [`Room`], [`Slot`] and [`AssignmentRecord`] data types
//! - Slot generation for a room's bunks ([`generate_slots`])
//! - Sex-match validation between rooms and occupants
//!
//! Nothing here performs I/O. Persistence and locking belong to
//! `bedline_store`; business rules that need both belong to `bedline_core`.
//!
//! ## Example
//!
//! ```rust
//! use bedline_model::{generate_slots, Room, RoomId, Sex};
//!
//! let room = Room::new(RoomId::new(1), "H-101", Sex::Male, Some(1));
//! let slots = generate_slots(&room, 2, 3).unwrap();
//! assert_eq!(slots.len(), 6);
//! assert_eq!(slots[0].code, "H-101-L1-C1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod assignment;
mod capacity;
mod error;
mod ids;
mod room;
mod slot;

pub use assignment::{AssignmentRecord, AssignmentStatus};
pub use capacity::{generate_slots, validate_sex_match, SlotDescriptor, DEFAULT_SLOTS_PER_BUNK};
pub use error::{ModelError, ModelResult};
pub use ids::{AssignmentId, OccupantId, RoomId, SlotId, SlotKey};
pub use room::{Room, RoomSpec, Sex};
pub use slot::{Occupancy, Slot, SlotState};
