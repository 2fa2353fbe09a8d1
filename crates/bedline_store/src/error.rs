//! Error types for store operations.

use bedline_model::{ModelError, OccupantId, RoomId, SlotId};
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A storage-level uniqueness or state constraint.
///
/// These are the final arbiter of races: two requests can both pass the
/// engine's pre-checks, but only one of them can satisfy the constraint at
/// commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The slot already has an occupant.
    SlotOccupied {
        /// The contested slot.
        slot: SlotId,
    },
    /// The slot has no occupant to release.
    SlotFree {
        /// The slot.
        slot: SlotId,
    },
    /// The occupant already holds another slot.
    OccupantHasActiveSlot {
        /// The occupant.
        occupant: OccupantId,
        /// The slot they already hold.
        slot: SlotId,
    },
    /// Another room already uses this code.
    DuplicateRoomCode {
        /// The code.
        code: String,
    },
    /// The room already has generated slots.
    RoomHasSlots {
        /// The room.
        room: RoomId,
    },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotOccupied { slot } => write!(f, "{slot} is occupied"),
            Self::SlotFree { slot } => write!(f, "{slot} is free"),
            Self::OccupantHasActiveSlot { occupant, slot } => {
                write!(f, "{occupant} already holds {slot}")
            }
            Self::DuplicateRoomCode { code } => write!(f, "room code {code:?} is taken"),
            Self::RoomHasSlots { room } => write!(f, "{room} already has slots"),
        }
    }
}

/// Errors that can occur in the occupancy store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No room with this ID.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// No slot with this ID.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// A constraint rejected the write.
    #[error("constraint violation: {constraint}")]
    ConstraintViolation {
        /// The violated constraint.
        constraint: Constraint,
    },

    /// The slot lock could not be acquired in time.
    #[error("lock wait timed out on {slot} after {waited:?}")]
    LockTimeout {
        /// The slot.
        slot: SlotId,
        /// How long the caller waited.
        waited: Duration,
    },

    /// Persisted data violates the store's invariants.
    #[error("store corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Model validation error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a constraint violation error.
    pub fn constraint(constraint: Constraint) -> Self {
        Self::ConstraintViolation { constraint }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }

    /// Returns true if the operation may succeed when retried later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }
}
