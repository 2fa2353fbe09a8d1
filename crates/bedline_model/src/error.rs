//! Error types for the capacity model.

use crate::room::Sex;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while validating the static shape of rooms and slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A room must have at least one bunk.
    #[error("invalid capacity: bunk count must be at least 1, got {bunks}")]
    InvalidCapacity {
        /// The requested bunk count.
        bunks: u32,
    },

    /// More bunks than a room can address.
    #[error("invalid capacity: bunk count must be at most {max}, got {bunks}")]
    CapacityTooLarge {
        /// The requested bunk count.
        bunks: u32,
        /// The largest accepted bunk count.
        max: u32,
    },

    /// Slots per bunk must be at least 1.
    #[error("invalid slots per bunk: {slots}")]
    InvalidSlotsPerBunk {
        /// The requested number of slots per bunk.
        slots: u8,
    },

    /// The occupant's sex does not match the room's restriction.
    #[error("sex mismatch: room is {room_sex}, occupant is {occupant_sex}")]
    SexMismatch {
        /// The room's sex restriction.
        room_sex: Sex,
        /// The occupant's sex.
        occupant_sex: Sex,
    },

    /// A sex code other than `H` or `M`.
    #[error("invalid sex code: {0:?} (expected H or M)")]
    InvalidSex(String),

    /// Input failed basic shape validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },
}

impl ModelError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
