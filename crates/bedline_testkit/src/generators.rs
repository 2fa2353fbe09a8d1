//! Property-based test generators using proptest.
//!
//! Provides strategies for shelter layouts and for random sequences of
//! engine operations, plus [`apply_op`] to run them.

use crate::fixtures::TestShelter;
use bedline_core::{AllocResult, Caller, Occupant};
use bedline_model::{OccupantId, Room, RoomSpec, Sex};
use proptest::prelude::*;

/// Strategy for a sex.
pub fn sex_strategy() -> impl Strategy<Value = Sex> {
    prop_oneof![Just(Sex::Male), Just(Sex::Female)]
}

/// Strategy for a `RoomSpec` with a valid, fresh-looking code.
pub fn room_spec_strategy() -> impl Strategy<Value = RoomSpec> {
    (
        prop::string::string_regex("[A-Z]{1,2}-[0-9]{2,3}").expect("Invalid regex"),
        sex_strategy(),
        prop::option::of(-1i32..10),
    )
        .prop_map(|(code, sex, floor)| RoomSpec::new(code, sex, floor))
}

/// Strategy for an occupant with the given ID.
pub fn occupant_strategy(id: OccupantId) -> impl Strategy<Value = Occupant> {
    (
        sex_strategy(),
        prop::string::string_regex("[A-Z][a-z]{2,8}").expect("Invalid regex"),
        prop::string::string_regex("[A-Z][a-z]{2,8}").expect("Invalid regex"),
        prop::option::of(prop::string::string_regex("[0-9]{6,10}").expect("Invalid regex")),
        prop::bool::weighted(0.9),
    )
        .prop_map(move |(sex, first, last, document, active)| {
            let mut occupant = Occupant::new(id, sex).with_name(first, last);
            occupant.document = document;
            occupant.active = active;
            occupant
        })
}

/// Shape of a generated shelter: rooms as `(sex, bunks)`.
#[derive(Debug, Clone)]
pub struct ShelterLayout {
    /// Rooms to create, coded `R-00`, `R-01`, ...
    pub rooms: Vec<(Sex, u32)>,
    /// Number of male occupants.
    pub men: usize,
    /// Number of female occupants.
    pub women: usize,
}

impl ShelterLayout {
    /// Builds a shelter with this layout.
    ///
    /// Returns the shelter, its rooms and every occupant ID.
    pub fn build(&self) -> (TestShelter, Vec<Room>, Vec<OccupantId>) {
        let shelter = TestShelter::new();
        let rooms = self
            .rooms
            .iter()
            .enumerate()
            .map(|(i, &(sex, bunks))| shelter.add_room(&format!("R-{i:02}"), sex, bunks))
            .collect();
        let mut occupants = shelter.add_occupants(Sex::Male, self.men);
        occupants.extend(shelter.add_occupants(Sex::Female, self.women));
        (shelter, rooms, occupants)
    }
}

/// Strategy for a small shelter layout.
pub fn layout_strategy() -> impl Strategy<Value = ShelterLayout> {
    (
        prop::collection::vec((sex_strategy(), 0u32..3), 1..4),
        0usize..6,
        0usize..6,
    )
        .prop_map(|(rooms, men, women)| ShelterLayout { rooms, men, women })
}

/// One engine operation, addressed by index so it applies to any layout.
#[derive(Debug, Clone)]
pub enum ShelterOp {
    /// Assign occupant `occupant` to slot `slot` (indices wrap).
    Assign {
        /// Slot index.
        slot: usize,
        /// Occupant index.
        occupant: usize,
    },
    /// Release slot `slot`.
    Release {
        /// Slot index.
        slot: usize,
    },
    /// Auto-assign occupant `occupant`.
    AutoAssign {
        /// Occupant index.
        occupant: usize,
    },
    /// Generate capacity for room `room`.
    Generate {
        /// Room index.
        room: usize,
        /// Bunks requested.
        bunks: u32,
    },
    /// Activate or deactivate room `room`.
    SetActive {
        /// Room index.
        room: usize,
        /// New state.
        active: bool,
    },
}

/// Strategy for a single operation.
pub fn op_strategy() -> impl Strategy<Value = ShelterOp> {
    prop_oneof![
        4 => (any::<usize>(), any::<usize>())
            .prop_map(|(slot, occupant)| ShelterOp::Assign { slot, occupant }),
        3 => any::<usize>().prop_map(|slot| ShelterOp::Release { slot }),
        3 => any::<usize>().prop_map(|occupant| ShelterOp::AutoAssign { occupant }),
        1 => (any::<usize>(), 1u32..4).prop_map(|(room, bunks)| ShelterOp::Generate { room, bunks }),
        1 => (any::<usize>(), any::<bool>())
            .prop_map(|(room, active)| ShelterOp::SetActive { room, active }),
    ]
}

/// Strategy for a sequence of operations.
pub fn op_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<ShelterOp>> {
    prop::collection::vec(op_strategy(), 0..max_len)
}

/// What applying an operation did.
#[derive(Debug)]
pub enum OpOutcome {
    /// The operation ran and returned this result.
    Ran(AllocResult<()>),
    /// Nothing to address (no slots, rooms or occupants).
    Skipped,
}

/// Applies `op` to the shelter.
pub fn apply_op(
    shelter: &TestShelter,
    rooms: &[Room],
    occupants: &[OccupantId],
    op: &ShelterOp,
) -> OpOutcome {
    let caller = Caller::staff("proptest");
    let slots = shelter.all_slots();
    let result = match *op {
        ShelterOp::Assign { slot, occupant } => {
            if slots.is_empty() || occupants.is_empty() {
                return OpOutcome::Skipped;
            }
            shelter
                .assign(
                    &caller,
                    slots[slot % slots.len()].id,
                    occupants[occupant % occupants.len()],
                )
                .map(drop)
        }
        ShelterOp::Release { slot } => {
            if slots.is_empty() {
                return OpOutcome::Skipped;
            }
            shelter
                .release(&caller, slots[slot % slots.len()].id)
                .map(drop)
        }
        ShelterOp::AutoAssign { occupant } => {
            if occupants.is_empty() {
                return OpOutcome::Skipped;
            }
            shelter
                .auto_assign(&caller, occupants[occupant % occupants.len()])
                .map(drop)
        }
        ShelterOp::Generate { room, bunks } => {
            if rooms.is_empty() {
                return OpOutcome::Skipped;
            }
            shelter
                .generate_capacity(rooms[room % rooms.len()].id, bunks)
                .map(drop)
        }
        ShelterOp::SetActive { room, active } => {
            if rooms.is_empty() {
                return OpOutcome::Skipped;
            }
            shelter
                .set_room_active(rooms[room % rooms.len()].id, active)
                .map(drop)
        }
    };
    OpOutcome::Ran(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn room_specs_are_valid(spec in room_spec_strategy()) {
            prop_assert!(spec.validate().is_ok());
        }

        #[test]
        fn layouts_build(layout in layout_strategy()) {
            let (shelter, rooms, occupants) = layout.build();
            prop_assert_eq!(rooms.len(), layout.rooms.len());
            prop_assert_eq!(occupants.len(), layout.men + layout.women);
            let expected: u32 = layout.rooms.iter().map(|(_, bunks)| bunks * 3).sum();
            prop_assert_eq!(shelter.all_slots().len() as u32, expected);
        }
    }
}
