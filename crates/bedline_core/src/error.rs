//! Error types for allocation operations.

use bedline_model::{ModelError, OccupantId, RoomId, Sex, SlotId};
use bedline_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type AllocResult<T> = Result<T, AllocError>;

/// Coarse classification of an [`AllocError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or rule-breaking input.
    Validation,
    /// A referenced room, slot or occupant does not exist.
    NotFound,
    /// The request lost to the current state of a slot or occupant.
    Conflict,
    /// No room can take the occupant.
    Capacity,
    /// The store failed.
    Storage,
}

/// Errors returned by the allocation engine.
///
/// Every variant names the entities involved so the caller can build a
/// precise message.
#[derive(Debug, Error)]
pub enum AllocError {
    /// Input failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// No room with this ID.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// No slot with this ID.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// The occupant is unknown to the directory or inactive.
    #[error("{0} is not eligible for a bed")]
    OccupantNotEligible(OccupantId),

    /// The slot already has an occupant.
    #[error("{slot} is already occupied")]
    SlotOccupied {
        /// The contested slot.
        slot: SlotId,
        /// The current occupant, when known.
        occupant: Option<OccupantId>,
    },

    /// The slot has no occupant to release.
    #[error("{slot} is already free")]
    SlotAlreadyFree {
        /// The slot.
        slot: SlotId,
    },

    /// The occupant already holds another slot.
    #[error("{occupant} already holds {slot}")]
    OccupantAlreadyAssigned {
        /// The occupant.
        occupant: OccupantId,
        /// The slot they hold.
        slot: SlotId,
    },

    /// The occupant's sex does not match the room's restriction.
    #[error("sex mismatch: room is {room_sex}, occupant is {occupant_sex}")]
    SexMismatch {
        /// The room's restriction.
        room_sex: Sex,
        /// The occupant's sex.
        occupant_sex: Sex,
    },

    /// The room's sex cannot change once it has slots.
    #[error("{room} already has slots; its sex restriction is fixed")]
    RoomSexLocked {
        /// The room.
        room: RoomId,
    },

    /// No active room of the occupant's sex has a free slot.
    #[error("no free bed for sex {sex}")]
    NoCapacity {
        /// The occupant's sex.
        sex: Sex,
    },

    /// The store failed.
    #[error("storage error: {0}")]
    Storage(StoreError),
}

impl AllocError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns the error's classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RoomNotFound(_) | Self::SlotNotFound(_) | Self::OccupantNotEligible(_) => {
                ErrorKind::NotFound
            }
            Self::SlotOccupied { .. }
            | Self::SlotAlreadyFree { .. }
            | Self::OccupantAlreadyAssigned { .. }
            | Self::SexMismatch { .. }
            | Self::RoomSexLocked { .. } => ErrorKind::Conflict,
            Self::NoCapacity { .. } => ErrorKind::Capacity,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns the HTTP status a transport layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Storage(StoreError::LockTimeout { .. }) => 503,
            // A sex mismatch is a conflict with the room, but the request
            // itself is what has to change.
            Self::SexMismatch { .. } => 400,
            _ => match self.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::NotFound => 404,
                ErrorKind::Conflict | ErrorKind::Capacity => 409,
                ErrorKind::Storage => 500,
            },
        }
    }

    /// Returns true if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns true if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_retryable())
    }

    /// Returns true if the request lost a race, or hit state changed by
    /// someone else since the caller last looked.
    #[must_use]
    pub fn is_stale_view(&self) -> bool {
        matches!(
            self,
            Self::SlotOccupied { .. }
                | Self::SlotAlreadyFree { .. }
                | Self::OccupantAlreadyAssigned { .. }
        )
    }

    /// Message suitable for showing to shelter staff.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SlotOccupied { .. } => {
                "This bed was just taken by someone else. Please refresh.".to_string()
            }
            Self::SlotAlreadyFree { .. } => {
                "This bed was already freed by someone else. Please refresh.".to_string()
            }
            Self::OccupantAlreadyAssigned { slot, .. } => {
                format!("This person already has a bed ({slot}). Please refresh.")
            }
            Self::Storage(StoreError::LockTimeout { .. }) => {
                "The system is busy. Please try again.".to_string()
            }
            Self::Storage(_) => "Internal error. Please contact support.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for AllocError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RoomNotFound(room) => Self::RoomNotFound(room),
            StoreError::SlotNotFound(slot) => Self::SlotNotFound(slot),
            StoreError::Model(model) => model.into(),
            other => Self::Storage(other),
        }
    }
}

impl From<ModelError> for AllocError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::SexMismatch {
                room_sex,
                occupant_sex,
            } => Self::SexMismatch {
                room_sex,
                occupant_sex,
            },
            other => Self::validation(other.to_string()),
        }
    }
}
