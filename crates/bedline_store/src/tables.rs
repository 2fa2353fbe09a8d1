//! Relational tables behind the in-memory store.
//!
//! Every mutation of slot occupancy goes through [`Tables::occupy`] or
//! [`Tables::vacate`], which update the slot, its assignment record and the
//! occupant index together.

use crate::error::{Constraint, StoreError, StoreResult};
use crate::snapshot::{StoreSnapshot, SNAPSHOT_VERSION};
use crate::store::{CapacityCount, RoomFilter};
use bedline_model::{
    AssignmentRecord, OccupantId, Room, RoomId, RoomSpec, Sex, Slot, SlotDescriptor, SlotId,
    SlotKey,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

#[derive(Debug)]
pub(crate) struct Tables {
    next_room_id: u32,
    next_slot_id: u64,
    rooms: BTreeMap<RoomId, Room>,
    slots: BTreeMap<SlotId, Slot>,
    /// Natural key index; ordered so a room's slots form a contiguous range.
    keys: BTreeMap<SlotKey, SlotId>,
    /// Partial unique index: occupant -> the one slot they hold.
    occupants: HashMap<OccupantId, SlotId>,
    assignments: Vec<AssignmentRecord>,
    /// slot -> index of its active record in `assignments`.
    active: HashMap<SlotId, usize>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            next_room_id: 1,
            next_slot_id: 1,
            rooms: BTreeMap::new(),
            slots: BTreeMap::new(),
            keys: BTreeMap::new(),
            occupants: HashMap::new(),
            assignments: Vec::new(),
            active: HashMap::new(),
        }
    }
}

fn room_range(room_id: RoomId) -> RangeInclusive<SlotKey> {
    SlotKey::new(room_id, 0, 0)..=SlotKey::new(room_id, u16::MAX, u8::MAX)
}

impl Tables {
    // === Rooms ===

    pub(crate) fn create_room(&mut self, spec: RoomSpec) -> StoreResult<Room> {
        spec.validate()?;
        let code = spec.code.trim();
        if self.rooms.values().any(|r| r.code == code) {
            return Err(StoreError::constraint(Constraint::DuplicateRoomCode {
                code: code.to_string(),
            }));
        }

        let id = RoomId::new(self.next_room_id);
        self.next_room_id += 1;
        let room = Room::from_spec(id, spec);
        self.rooms.insert(id, room.clone());
        Ok(room)
    }

    pub(crate) fn room(&self, room_id: RoomId) -> StoreResult<&Room> {
        self.rooms
            .get(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))
    }

    fn room_mut(&mut self, room_id: RoomId) -> StoreResult<&mut Room> {
        self.rooms
            .get_mut(&room_id)
            .ok_or(StoreError::RoomNotFound(room_id))
    }

    pub(crate) fn rooms(&self, filter: &RoomFilter) -> Vec<Room> {
        let mut rooms: Vec<Room> = self
            .rooms
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code).then(a.id.cmp(&b.id)));
        rooms
    }

    pub(crate) fn set_room_active(&mut self, room_id: RoomId, active: bool) -> StoreResult<Room> {
        let room = self.room_mut(room_id)?;
        room.active = active;
        Ok(room.clone())
    }

    pub(crate) fn set_room_sex(&mut self, room_id: RoomId, sex: Sex) -> StoreResult<Room> {
        self.room(room_id)?;
        if self.keys.range(room_range(room_id)).next().is_some() {
            return Err(StoreError::constraint(Constraint::RoomHasSlots {
                room: room_id,
            }));
        }
        let room = self.room_mut(room_id)?;
        room.sex = sex;
        Ok(room.clone())
    }

    // === Slots ===

    pub(crate) fn insert_slots(
        &mut self,
        room_id: RoomId,
        descriptors: &[SlotDescriptor],
        bunk_capacity: u32,
    ) -> StoreResult<usize> {
        self.room(room_id)?;
        if let Some(foreign) = descriptors.iter().find(|d| d.key.room_id != room_id) {
            return Err(StoreError::Model(bedline_model::ModelError::validation(
                format!("slot {} does not belong to {room_id}", foreign.key),
            )));
        }

        let mut created = 0;
        for descriptor in descriptors {
            if self.keys.contains_key(&descriptor.key) {
                continue;
            }
            let id = SlotId::new(self.next_slot_id);
            self.next_slot_id += 1;
            self.keys.insert(descriptor.key, id);
            self.slots
                .insert(id, Slot::new(id, descriptor.key, descriptor.code.clone()));
            created += 1;
        }

        let room = self.room_mut(room_id)?;
        room.bunk_capacity = room.bunk_capacity.max(bunk_capacity);
        Ok(created)
    }

    pub(crate) fn slot(&self, slot_id: SlotId) -> StoreResult<&Slot> {
        self.slots
            .get(&slot_id)
            .ok_or(StoreError::SlotNotFound(slot_id))
    }

    pub(crate) fn contains_slot(&self, slot_id: SlotId) -> bool {
        self.slots.contains_key(&slot_id)
    }

    pub(crate) fn slots_in_room(&self, room_id: RoomId) -> impl Iterator<Item = &Slot> + '_ {
        self.keys
            .range(room_range(room_id))
            .filter_map(|(_, id)| self.slots.get(id))
    }

    pub(crate) fn slot_of_occupant(&self, occupant: OccupantId) -> Option<&Slot> {
        self.occupants
            .get(&occupant)
            .and_then(|id| self.slots.get(id))
    }

    pub(crate) fn assigned_occupants(&self) -> Vec<OccupantId> {
        let mut ids: Vec<_> = self.occupants.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn count(&self, room_id: RoomId) -> CapacityCount {
        let (total, occupied) = self
            .slots_in_room(room_id)
            .fold((0u32, 0u32), |(total, occupied), slot| {
                (total + 1, occupied + u32::from(!slot.is_free()))
            });
        CapacityCount {
            room_id,
            total,
            occupied,
        }
    }

    // === Occupancy write path ===

    pub(crate) fn occupy(
        &mut self,
        slot_id: SlotId,
        occupant: OccupantId,
        now: DateTime<Utc>,
        actor: Option<&str>,
    ) -> StoreResult<Slot> {
        let slot = self.slot(slot_id)?;
        if !slot.is_free() || self.active.contains_key(&slot_id) {
            return Err(StoreError::constraint(Constraint::SlotOccupied {
                slot: slot_id,
            }));
        }
        if let Some(&held) = self.occupants.get(&occupant) {
            return Err(StoreError::constraint(Constraint::OccupantHasActiveSlot {
                occupant,
                slot: held,
            }));
        }

        let record = AssignmentRecord::open(slot_id, occupant, now, actor.map(str::to_string));
        self.active.insert(slot_id, self.assignments.len());
        self.assignments.push(record);
        self.occupants.insert(occupant, slot_id);

        let slot = self
            .slots
            .get_mut(&slot_id)
            .ok_or(StoreError::SlotNotFound(slot_id))?;
        slot.occupy(occupant, now);
        Ok(slot.clone())
    }

    pub(crate) fn vacate(
        &mut self,
        slot_id: SlotId,
        now: DateTime<Utc>,
        actor: Option<&str>,
    ) -> StoreResult<Slot> {
        let occupant = self
            .slot(slot_id)?
            .occupant_id()
            .ok_or(StoreError::constraint(Constraint::SlotFree { slot: slot_id }))?;

        if let Some(index) = self.active.remove(&slot_id) {
            if let Some(record) = self.assignments.get_mut(index) {
                record.close(now, actor.map(str::to_string));
            }
        }
        self.occupants.remove(&occupant);

        let slot = self
            .slots
            .get_mut(&slot_id)
            .ok_or(StoreError::SlotNotFound(slot_id))?;
        slot.vacate();
        Ok(slot.clone())
    }

    // === Assignment records ===

    pub(crate) fn history(&self, slot_id: SlotId) -> Vec<AssignmentRecord> {
        self.assignments
            .iter()
            .filter(|r| r.slot_id == slot_id)
            .cloned()
            .collect()
    }

    pub(crate) fn active_record(&self, slot_id: SlotId) -> Option<&AssignmentRecord> {
        self.active
            .get(&slot_id)
            .and_then(|&index| self.assignments.get(index))
    }

    // === Snapshots ===

    pub(crate) fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            rooms: self.rooms.values().cloned().collect(),
            slots: self.slots.values().cloned().collect(),
            assignments: self.assignments.clone(),
        }
    }

    /// Rebuilds tables and indexes from a snapshot, rejecting any snapshot
    /// that violates the occupancy invariants.
    pub(crate) fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::corrupted(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut tables = Self::default();

        for room in snapshot.rooms {
            if tables.rooms.values().any(|r| r.code == room.code) {
                return Err(StoreError::corrupted(format!(
                    "duplicate room code {:?}",
                    room.code
                )));
            }
            let after = room.id.as_u32().checked_add(1).ok_or_else(|| {
                StoreError::corrupted(format!("{} is out of range", room.id))
            })?;
            tables.next_room_id = tables.next_room_id.max(after);
            if tables.rooms.insert(room.id, room).is_some() {
                return Err(StoreError::corrupted("duplicate room id"));
            }
        }

        for slot in snapshot.slots {
            if !tables.rooms.contains_key(&slot.room_id()) {
                return Err(StoreError::corrupted(format!(
                    "{} references missing {}",
                    slot.id,
                    slot.room_id()
                )));
            }
            if tables.keys.insert(slot.key, slot.id).is_some() {
                return Err(StoreError::corrupted(format!(
                    "duplicate slot key {}",
                    slot.key
                )));
            }
            if let Some(occupant) = slot.occupant_id() {
                if tables.occupants.insert(occupant, slot.id).is_some() {
                    return Err(StoreError::corrupted(format!(
                        "{occupant} holds more than one slot"
                    )));
                }
            }
            let after = slot.id.as_u64().checked_add(1).ok_or_else(|| {
                StoreError::corrupted(format!("{} is out of range", slot.id))
            })?;
            tables.next_slot_id = tables.next_slot_id.max(after);
            if tables.slots.insert(slot.id, slot).is_some() {
                return Err(StoreError::corrupted("duplicate slot id"));
            }
        }

        for (index, record) in snapshot.assignments.into_iter().enumerate() {
            let slot = tables.slots.get(&record.slot_id).ok_or_else(|| {
                StoreError::corrupted(format!("record {} references missing slot", record.id))
            })?;
            if record.is_active() {
                if slot.occupant_id() != Some(record.occupant_id) {
                    return Err(StoreError::corrupted(format!(
                        "active record {} disagrees with {}",
                        record.id, slot.id
                    )));
                }
                if tables.active.insert(record.slot_id, index).is_some() {
                    return Err(StoreError::corrupted(format!(
                        "{} has more than one active record",
                        record.slot_id
                    )));
                }
            }
            tables.assignments.push(record);
        }

        if let Some(slot) = tables
            .slots
            .values()
            .find(|s| !s.is_free() && !tables.active.contains_key(&s.id))
        {
            return Err(StoreError::corrupted(format!(
                "{} is occupied without an active record",
                slot.id
            )));
        }

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedline_model::{generate_slots, AssignmentStatus};

    fn tables_with_room(bunks: u32) -> (Tables, Room) {
        let mut tables = Tables::default();
        let room = tables
            .create_room(RoomSpec::new("H-101", Sex::Male, Some(1)))
            .unwrap();
        let slots = generate_slots(&room, bunks, 3).unwrap();
        tables.insert_slots(room.id, &slots, bunks).unwrap();
        (tables, room)
    }

    #[test]
    fn duplicate_room_code_rejected() {
        let (mut tables, _) = tables_with_room(1);
        let err = tables
            .create_room(RoomSpec::new("H-101", Sex::Female, None))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation {
                constraint: Constraint::DuplicateRoomCode { .. }
            }
        ));
    }

    #[test]
    fn insert_is_additive() {
        let (mut tables, room) = tables_with_room(2);
        let first = tables.slots_in_room(room.id).next().unwrap().id;
        tables
            .occupy(first, OccupantId::new(1), Utc::now(), None)
            .unwrap();

        let layout = generate_slots(&room, 3, 3).unwrap();
        let created = tables.insert_slots(room.id, &layout, 3).unwrap();
        assert_eq!(created, 3);
        assert_eq!(tables.count(room.id).total, 9);
        assert!(!tables.slot(first).unwrap().is_free());
        assert_eq!(tables.room(room.id).unwrap().bunk_capacity, 3);
    }

    #[test]
    fn capacity_never_shrinks() {
        let (mut tables, room) = tables_with_room(3);
        let layout = generate_slots(&room, 1, 3).unwrap();
        assert_eq!(tables.insert_slots(room.id, &layout, 1).unwrap(), 0);
        assert_eq!(tables.room(room.id).unwrap().bunk_capacity, 3);
    }

    #[test]
    fn occupy_updates_every_index() {
        let (mut tables, room) = tables_with_room(1);
        let slot = tables.slots_in_room(room.id).next().unwrap().id;
        let occupant = OccupantId::new(42);
        tables.occupy(slot, occupant, Utc::now(), Some("ana")).unwrap();

        assert_eq!(tables.slot_of_occupant(occupant).unwrap().id, slot);
        let record = tables.active_record(slot).unwrap();
        assert_eq!(record.occupant_id, occupant);
        assert_eq!(record.assigned_by.as_deref(), Some("ana"));
        assert_eq!(tables.count(room.id).occupied, 1);
    }

    #[test]
    fn occupant_unique_across_slots() {
        let (mut tables, room) = tables_with_room(1);
        let ids: Vec<_> = tables.slots_in_room(room.id).map(|s| s.id).collect();
        let occupant = OccupantId::new(1);
        tables.occupy(ids[0], occupant, Utc::now(), None).unwrap();

        let err = tables.occupy(ids[1], occupant, Utc::now(), None).unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation {
                constraint: Constraint::OccupantHasActiveSlot { slot, .. }
            } if slot == ids[0]
        ));
        assert!(tables.slot(ids[1]).unwrap().is_free());
    }

    #[test]
    fn vacate_closes_record() {
        let (mut tables, room) = tables_with_room(1);
        let slot = tables.slots_in_room(room.id).next().unwrap().id;
        tables
            .occupy(slot, OccupantId::new(1), Utc::now(), None)
            .unwrap();
        tables.vacate(slot, Utc::now(), Some("luis")).unwrap();

        assert!(tables.slot(slot).unwrap().is_free());
        assert!(tables.active_record(slot).is_none());
        assert!(tables.slot_of_occupant(OccupantId::new(1)).is_none());
        let history = tables.history(slot);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, AssignmentStatus::Ended);
        assert!(history[0].ended_at.is_some());
    }

    #[test]
    fn vacate_free_slot_rejected() {
        let (mut tables, room) = tables_with_room(1);
        let slot = tables.slots_in_room(room.id).next().unwrap().id;
        assert!(matches!(
            tables.vacate(slot, Utc::now(), None),
            Err(StoreError::ConstraintViolation {
                constraint: Constraint::SlotFree { .. }
            })
        ));
    }

    #[test]
    fn sex_locked_after_generation() {
        let mut tables = Tables::default();
        let room = tables
            .create_room(RoomSpec::new("M-201", Sex::Female, None))
            .unwrap();
        tables.set_room_sex(room.id, Sex::Male).unwrap();

        let slots = generate_slots(tables.room(room.id).unwrap(), 1, 3).unwrap();
        tables.insert_slots(room.id, &slots, 1).unwrap();
        assert!(tables.set_room_sex(room.id, Sex::Female).is_err());
    }

    #[test]
    fn snapshot_roundtrip_rebuilds_indexes() {
        let (mut tables, room) = tables_with_room(1);
        let slot = tables.slots_in_room(room.id).next().unwrap().id;
        tables
            .occupy(slot, OccupantId::new(9), Utc::now(), None)
            .unwrap();

        let restored = Tables::from_snapshot(tables.to_snapshot()).unwrap();
        assert_eq!(restored.slot_of_occupant(OccupantId::new(9)).unwrap().id, slot);
        assert!(restored.active_record(slot).is_some());
        assert_eq!(restored.next_slot_id, tables.next_slot_id);
    }

    #[test]
    fn snapshot_with_orphan_occupancy_rejected() {
        let (mut tables, room) = tables_with_room(1);
        let slot = tables.slots_in_room(room.id).next().unwrap().id;
        tables
            .occupy(slot, OccupantId::new(9), Utc::now(), None)
            .unwrap();

        let mut snapshot = tables.to_snapshot();
        snapshot.assignments.clear();
        assert!(matches!(
            Tables::from_snapshot(snapshot),
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn snapshot_with_max_room_id_rejected() {
        let mut snapshot = StoreSnapshot::default();
        snapshot
            .rooms
            .push(Room::new(RoomId::new(u32::MAX), "H-101", Sex::Male, None));
        let err = Tables::from_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn snapshot_with_max_slot_id_rejected() {
        let room = Room::new(RoomId::new(1), "H-101", Sex::Male, None);
        let mut snapshot = StoreSnapshot::default();
        snapshot.slots.push(Slot::new(
            SlotId::new(u64::MAX),
            SlotKey::new(room.id, 1, 1),
            "H-101-L1-C1",
        ));
        snapshot.rooms.push(room);
        assert!(matches!(
            Tables::from_snapshot(snapshot),
            Err(StoreError::Corrupted { .. })
        ));
    }
}
