//! Slot generation and capacity rules.

use crate::error::{ModelError, ModelResult};
use crate::ids::SlotKey;
use crate::room::{Room, Sex};

/// Number of slots in one bunk unit.
pub const DEFAULT_SLOTS_PER_BUNK: u8 = 3;

/// A slot to be persisted: its natural key and display code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDescriptor {
    /// Natural key.
    pub key: SlotKey,
    /// Display code, `{room}-L{bunk}-C{slot}`.
    pub code: String,
}

/// Produces the full slot layout for `bunks` bunks of `slots_per_bunk`
/// slots each, ordered by bunk then slot.
///
/// The output is deterministic. Persisting it is additive: keys that
/// already exist are skipped by the store, never overwritten.
///
/// # Errors
///
/// - [`ModelError::InvalidCapacity`] if `bunks < 1`
/// - [`ModelError::CapacityTooLarge`] if `bunks` exceeds `u16::MAX`
/// - [`ModelError::InvalidSlotsPerBunk`] if `slots_per_bunk < 1`
pub fn generate_slots(
    room: &Room,
    bunks: u32,
    slots_per_bunk: u8,
) -> ModelResult<Vec<SlotDescriptor>> {
    if bunks < 1 {
        return Err(ModelError::InvalidCapacity { bunks });
    }
    let max = u32::from(u16::MAX);
    if bunks > max {
        return Err(ModelError::CapacityTooLarge { bunks, max });
    }
    if slots_per_bunk < 1 {
        return Err(ModelError::InvalidSlotsPerBunk {
            slots: slots_per_bunk,
        });
    }

    let prefix = room.code_prefix();
    let mut out = Vec::with_capacity(bunks as usize * usize::from(slots_per_bunk));
    for bunk in 1..=bunks as u16 {
        for position in 1..=slots_per_bunk {
            out.push(SlotDescriptor {
                key: SlotKey::new(room.id, bunk, position),
                code: format!("{prefix}-L{bunk}-C{position}"),
            });
        }
    }
    Ok(out)
}

/// Checks that an occupant of `occupant_sex` may sleep in `room`.
///
/// # Errors
///
/// Returns [`ModelError::SexMismatch`] if the sexes differ.
pub fn validate_sex_match(room: &Room, occupant_sex: Sex) -> ModelResult<()> {
    if room.sex == occupant_sex {
        Ok(())
    } else {
        Err(ModelError::SexMismatch {
            room_sex: room.sex,
            occupant_sex,
        })
    }
}
