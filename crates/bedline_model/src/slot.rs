//! Slots: the unit of occupancy.

use crate::ids::{OccupantId, RoomId, SlotId, SlotKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    /// No occupant.
    Free,
    /// Held by exactly one occupant.
    Occupied,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => f.write_str("FREE"),
            Self::Occupied => f.write_str("OCCUPIED"),
        }
    }
}

/// Occupancy of a slot.
///
/// The occupant and the assignment timestamp only exist in the `Occupied`
/// variant, so `state = OCCUPIED ⇔ occupant ≠ null` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occupancy {
    /// No occupant.
    Free,
    /// Held by `occupant` since `since`.
    Occupied {
        /// The occupant.
        occupant: OccupantId,
        /// When the assignment was committed.
        since: DateTime<Utc>,
    },
}

/// A single sleeping place within a bunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot ID.
    pub id: SlotId,
    /// Natural key.
    pub key: SlotKey,
    /// Human-readable code, e.g. `H-101-L1-C2`.
    pub code: String,
    occupancy: Occupancy,
}

impl Slot {
    /// Creates a free slot.
    pub fn new(id: SlotId, key: SlotKey, code: impl Into<String>) -> Self {
        Self {
            id,
            key,
            code: code.into(),
            occupancy: Occupancy::Free,
        }
    }

    /// Returns the owning room.
    #[must_use]
    pub const fn room_id(&self) -> RoomId {
        self.key.room_id
    }

    /// Returns the bunk ordinal.
    #[must_use]
    pub const fn bunk(&self) -> u16 {
        self.key.bunk
    }

    /// Returns the slot ordinal within its bunk.
    #[must_use]
    pub const fn position(&self) -> u8 {
        self.key.position
    }

    /// Returns the current occupancy.
    #[must_use]
    pub const fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Returns the coarse state.
    #[must_use]
    pub const fn state(&self) -> SlotState {
        match self.occupancy {
            Occupancy::Free => SlotState::Free,
            Occupancy::Occupied { .. } => SlotState::Occupied,
        }
    }

    /// Returns true if the slot has no occupant.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        matches!(self.occupancy, Occupancy::Free)
    }

    /// Returns the occupant, if any.
    #[must_use]
    pub const fn occupant_id(&self) -> Option<OccupantId> {
        match self.occupancy {
            Occupancy::Free => None,
            Occupancy::Occupied { occupant, .. } => Some(occupant),
        }
    }

    /// Returns when the current occupant was assigned, if any.
    #[must_use]
    pub const fn assigned_at(&self) -> Option<DateTime<Utc>> {
        match self.occupancy {
            Occupancy::Free => None,
            Occupancy::Occupied { since, .. } => Some(since),
        }
    }

    /// Marks the slot occupied.
    ///
    /// Callers must hold the slot's lock and keep the assignment record in
    /// step; the store is the only caller.
    pub fn occupy(&mut self, occupant: OccupantId, since: DateTime<Utc>) {
        self.occupancy = Occupancy::Occupied { occupant, since };
    }

    /// Marks the slot free and returns the previous occupancy.
    pub fn vacate(&mut self) -> Occupancy {
        std::mem::replace(&mut self.occupancy, Occupancy::Free)
    }
}
