//! Rooms and their sex restriction.

use crate::error::{ModelError, ModelResult};
use crate::ids::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sex restriction of a room, and sex of an occupant.
///
/// Serialized with the single-letter codes used on the shelter's paper
/// records: `H` for men, `M` for women.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Men (`H`).
    #[serde(rename = "H")]
    Male,
    /// Women (`M`).
    #[serde(rename = "M")]
    Female,
}

impl Sex {
    /// Returns the single-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "H",
            Self::Female => "M",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "H" | "h" => Ok(Self::Male),
            "M" | "m" => Ok(Self::Female),
            other => Err(ModelError::InvalidSex(other.to_string())),
        }
    }
}

/// Input for creating a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Human-readable room code, e.g. `H-101`. Must be unique.
    pub code: String,
    /// Sex restriction.
    pub sex: Sex,
    /// Floor number, if known.
    pub floor: Option<i32>,
}

impl RoomSpec {
    /// Creates a new room spec.
    pub fn new(code: impl Into<String>, sex: Sex, floor: Option<i32>) -> Self {
        Self {
            code: code.into(),
            sex,
            floor,
        }
    }

    /// Checks the room code.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] if the code is blank or contains
    /// whitespace.
    pub fn validate(&self) -> ModelResult<()> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err(ModelError::validation("room code is required"));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(ModelError::validation(format!(
                "room code {code:?} must not contain whitespace"
            )));
        }
        Ok(())
    }
}

/// A physical room.
///
/// Rooms are never hard-deleted; they are deactivated through
/// [`Room::active`]. `bunk_capacity` is the declared number of bunks and
/// only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Room ID.
    pub id: RoomId,
    /// Human-readable code.
    pub code: String,
    /// Sex restriction; fixed once slots have been generated.
    pub sex: Sex,
    /// Floor number.
    pub floor: Option<i32>,
    /// Declared number of bunks.
    pub bunk_capacity: u32,
    /// Whether the room accepts new occupants.
    pub active: bool,
}

impl Room {
    /// Creates an active room with no bunks.
    pub fn new(id: RoomId, code: impl Into<String>, sex: Sex, floor: Option<i32>) -> Self {
        Self {
            id,
            code: code.into(),
            sex,
            floor,
            bunk_capacity: 0,
            active: true,
        }
    }

    /// Creates a room from a validated spec.
    pub fn from_spec(id: RoomId, spec: RoomSpec) -> Self {
        Self::new(id, spec.code.trim(), spec.sex, spec.floor)
    }

    /// Prefix used when building slot codes.
    ///
    /// Falls back to `H{id}` when the room has no code.
    #[must_use]
    pub fn code_prefix(&self) -> String {
        if self.code.is_empty() {
            format!("H{}", self.id.as_u32())
        } else {
            self.code.clone()
        }
    }
}
