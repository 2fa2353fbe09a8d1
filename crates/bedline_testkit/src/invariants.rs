//! Occupancy invariant checks over a store snapshot.

use bedline_model::{AssignmentStatus, OccupantId, SlotId, SlotKey};
use bedline_store::StoreSnapshot;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation(pub String);

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks every occupancy invariant.
///
/// - A slot is OCCUPIED iff exactly one ACTIVE record exists for it, and
///   that record names the slot's occupant
/// - An occupant holds at most one OCCUPIED slot
/// - ENDED records have an end time no earlier than their start
/// - Slot keys and room codes are unique, and every slot's room exists
///
/// Returns every violation found, not just the first.
pub fn check_invariants(snapshot: &StoreSnapshot) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation(message));

    let mut codes = HashSet::new();
    for room in &snapshot.rooms {
        if !codes.insert(room.code.as_str()) {
            fail(format!("room code {:?} is duplicated", room.code));
        }
    }
    let room_ids: HashSet<_> = snapshot.rooms.iter().map(|r| r.id).collect();

    let mut active_by_slot: HashMap<SlotId, Vec<OccupantId>> = HashMap::new();
    for record in &snapshot.assignments {
        match record.status {
            AssignmentStatus::Active => {
                if record.ended_at.is_some() {
                    fail(format!("active record {} has an end time", record.id));
                }
                active_by_slot
                    .entry(record.slot_id)
                    .or_default()
                    .push(record.occupant_id);
            }
            AssignmentStatus::Ended => match record.ended_at {
                Some(ended) if ended < record.started_at => {
                    fail(format!("record {} ends before it starts", record.id));
                }
                Some(_) => {}
                None => fail(format!("ended record {} has no end time", record.id)),
            },
        }
    }

    let mut keys: HashSet<SlotKey> = HashSet::new();
    let mut holders: HashMap<OccupantId, SlotId> = HashMap::new();
    for slot in &snapshot.slots {
        if !keys.insert(slot.key) {
            fail(format!("slot key {} is duplicated", slot.key));
        }
        if !room_ids.contains(&slot.room_id()) {
            fail(format!("{} belongs to unknown {}", slot.id, slot.room_id()));
        }

        let active = active_by_slot.remove(&slot.id).unwrap_or_default();
        match slot.occupant_id() {
            Some(occupant) => {
                if active != vec![occupant] {
                    fail(format!(
                        "{} is occupied by {occupant} but has active records for {active:?}",
                        slot.id
                    ));
                }
                if let Some(other) = holders.insert(occupant, slot.id) {
                    fail(format!("{occupant} holds both {other} and {}", slot.id));
                }
            }
            None => {
                if !active.is_empty() {
                    fail(format!(
                        "{} is free but has {} active record(s)",
                        slot.id,
                        active.len()
                    ));
                }
            }
        }
    }

    for slot in active_by_slot.keys() {
        fail(format!("active record for unknown {slot}"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
