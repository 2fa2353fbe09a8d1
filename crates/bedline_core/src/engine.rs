//! The allocation engine.

use crate::caller::Caller;
use crate::config::EngineConfig;
use crate::directory::{BeneficiaryDirectory, Occupant};
use crate::error::{AllocError, AllocResult};
use crate::report::CapacityReport;
use bedline_model::{
    generate_slots, validate_sex_match, OccupantId, Room, RoomId, RoomSpec, Sex, Slot, SlotId,
};
use bedline_store::{
    CapacityCount, Constraint, OccupancyStore, RoomFilter, SlotTransaction, StoreError,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of [`AllocationEngine::generate_capacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneratedCapacity {
    /// The room.
    pub room_id: RoomId,
    /// Slots in the requested layout.
    pub requested: usize,
    /// Slots actually created; existing ones are skipped.
    pub created: usize,
}

/// Orchestrates occupancy rules on top of an [`OccupancyStore`].
///
/// Slots move `FREE -> OCCUPIED -> FREE` and nothing else: assigning an
/// occupied slot and releasing a free one are both rejected, so callers
/// can tell when their view is stale.
///
/// Pre-checks run under the slot's lock but are advisory. The store's
/// constraints at commit decide races, and the engine translates a lost
/// race into the matching conflict instead of retrying it.
pub struct AllocationEngine<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    config: EngineConfig,
}

impl<S, D> AllocationEngine<S, D>
where
    S: OccupancyStore,
    D: BeneficiaryDirectory,
{
    /// Creates an engine with default configuration.
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self::with_config(store, directory, EngineConfig::default())
    }

    /// Creates an engine.
    pub fn with_config(store: Arc<S>, directory: Arc<D>, config: EngineConfig) -> Self {
        Self {
            store,
            directory,
            config,
        }
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the beneficiary directory.
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a report builder over the same store and directory.
    pub fn report(&self) -> CapacityReport<S, D> {
        CapacityReport::new(
            Arc::clone(&self.store),
            Arc::clone(&self.directory),
            self.config.available_occupants_limit,
        )
    }

    // === Rooms ===

    /// Registers a room.
    ///
    /// # Errors
    ///
    /// `Validation` if the code is blank or already used.
    pub fn create_room(&self, spec: RoomSpec) -> AllocResult<Room> {
        let room = self.store.create_room(spec).map_err(translate)?;
        info!(room = %room.id, code = %room.code, sex = %room.sex, "room created");
        Ok(room)
    }

    /// Activates or deactivates a room.
    pub fn set_room_active(&self, room_id: RoomId, active: bool) -> AllocResult<Room> {
        let room = self.store.set_room_active(room_id, active)?;
        info!(room = %room_id, active, "room activity changed");
        Ok(room)
    }

    /// Changes a room's sex restriction.
    ///
    /// # Errors
    ///
    /// `RoomSexLocked` once the room has slots.
    pub fn change_room_sex(&self, room_id: RoomId, sex: Sex) -> AllocResult<Room> {
        let room = self.store.set_room_sex(room_id, sex).map_err(translate)?;
        info!(room = %room_id, sex = %sex, "room sex changed");
        Ok(room)
    }

    /// Generates `bunks` bunks of slots for a room.
    ///
    /// Additive only: existing slots, occupied or not, are left untouched
    /// and the room's declared capacity never shrinks.
    ///
    /// # Errors
    ///
    /// - `RoomNotFound` if the room does not exist
    /// - `Validation` if `bunks < 1`
    pub fn generate_capacity(&self, room_id: RoomId, bunks: u32) -> AllocResult<GeneratedCapacity> {
        let room = self.store.room(room_id)?;
        let layout = generate_slots(&room, bunks, self.config.slots_per_bunk)?;
        let created = self.store.insert_slots(room_id, &layout, bunks)?;

        info!(
            room = %room_id,
            bunks,
            requested = layout.len(),
            created,
            "capacity generated"
        );
        Ok(GeneratedCapacity {
            room_id,
            requested: layout.len(),
            created,
        })
    }

    // === Occupancy ===

    /// Assigns an occupant to a slot.
    ///
    /// # Errors
    ///
    /// - `SlotNotFound` if the slot does not exist
    /// - `SlotOccupied` if the slot already has an occupant
    /// - `OccupantNotEligible` if the occupant is unknown or inactive
    /// - `Validation` if the room is inactive
    /// - `SexMismatch` if the occupant may not sleep in the room
    /// - `OccupantAlreadyAssigned` if the occupant holds another slot
    /// - `Storage` on lock timeout or store failure
    pub fn assign(
        &self,
        caller: &Caller,
        slot_id: SlotId,
        occupant_id: OccupantId,
    ) -> AllocResult<Slot> {
        let txn = self.store.lock_slot(slot_id)?;

        if let Err(err) = self.check_assign(&txn, occupant_id) {
            debug!(slot = %slot_id, occupant = %occupant_id, error = %err, "assign rejected");
            txn.rollback();
            return Err(err);
        }

        match txn.commit_assign(occupant_id, Utc::now(), caller.name()) {
            Ok(slot) => {
                info!(
                    slot = %slot_id,
                    code = %slot.code,
                    occupant = %occupant_id,
                    caller = %caller,
                    "slot assigned"
                );
                Ok(slot)
            }
            Err(err) => {
                let err = translate(err);
                if err.is_stale_view() {
                    warn!(slot = %slot_id, occupant = %occupant_id, error = %err, "assign lost race at commit");
                }
                Err(err)
            }
        }
    }

    fn check_assign(&self, txn: &S::Txn<'_>, occupant_id: OccupantId) -> AllocResult<()> {
        let slot = txn.slot();
        if !slot.is_free() {
            return Err(AllocError::SlotOccupied {
                slot: slot.id,
                occupant: slot.occupant_id(),
            });
        }

        let occupant = self.eligible_occupant(occupant_id)?;

        let room = txn.room();
        if !room.active {
            return Err(AllocError::validation(format!(
                "{} ({}) is inactive",
                room.id, room.code
            )));
        }
        validate_sex_match(room, occupant.sex)?;

        match txn.find_active_slot_for_occupant(occupant_id)? {
            Some(held) if held.id != slot.id => Err(AllocError::OccupantAlreadyAssigned {
                occupant: occupant_id,
                slot: held.id,
            }),
            _ => Ok(()),
        }
    }

    /// Releases a slot.
    ///
    /// # Errors
    ///
    /// - `SlotNotFound` if the slot does not exist
    /// - `SlotAlreadyFree` if the slot has no occupant
    /// - `Storage` on lock timeout or store failure
    pub fn release(&self, caller: &Caller, slot_id: SlotId) -> AllocResult<Slot> {
        let txn = self.store.lock_slot(slot_id)?;

        let Some(occupant) = txn.slot().occupant_id() else {
            debug!(slot = %slot_id, "release rejected: slot already free");
            txn.rollback();
            return Err(AllocError::SlotAlreadyFree { slot: slot_id });
        };

        match txn.commit_release(Utc::now(), caller.name()) {
            Ok(slot) => {
                info!(
                    slot = %slot_id,
                    code = %slot.code,
                    occupant = %occupant,
                    caller = %caller,
                    "slot released"
                );
                Ok(slot)
            }
            Err(err) => {
                let err = translate(err);
                if err.is_stale_view() {
                    warn!(slot = %slot_id, error = %err, "release lost race at commit");
                }
                Err(err)
            }
        }
    }

    /// Places an occupant in the best available slot.
    ///
    /// Picks the active room of the occupant's sex with the most free slots
    /// (ties go to the lowest room code), then its lowest free slot. A race
    /// lost on that slot triggers a fresh search, up to
    /// [`EngineConfig::auto_assign_retries`] times.
    ///
    /// # Errors
    ///
    /// - `OccupantNotEligible` if the occupant is unknown or inactive
    /// - `OccupantAlreadyAssigned` if the occupant already holds a slot
    /// - `NoCapacity` if no room can take the occupant
    pub fn auto_assign(&self, caller: &Caller, occupant_id: OccupantId) -> AllocResult<Slot> {
        let occupant = self.eligible_occupant(occupant_id)?;
        if let Some(held) = self.store.find_active_slot_for_occupant(occupant_id)? {
            return Err(AllocError::OccupantAlreadyAssigned {
                occupant: occupant_id,
                slot: held.id,
            });
        }

        let attempts = self.config.auto_assign_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let Some((room, count)) = self.best_room(occupant.sex)? else {
                break;
            };
            let Some(slot) = self.store.first_free_slot(room.id)? else {
                warn!(room = %room.id, attempt, "room filled up during auto-assign search");
                continue;
            };
            debug!(
                occupant = %occupant_id,
                room = %room.id,
                code = %room.code,
                free = count.free(),
                slot = %slot.id,
                attempt,
                "auto-assign picked slot"
            );

            match self.assign(caller, slot.id, occupant_id) {
                Err(AllocError::SlotOccupied { slot, .. }) => {
                    warn!(slot = %slot, occupant = %occupant_id, attempt, "auto-assign lost slot race");
                }
                other => return other,
            }
        }

        Err(AllocError::NoCapacity { sex: occupant.sex })
    }

    fn best_room(&self, sex: Sex) -> AllocResult<Option<(Room, CapacityCount)>> {
        let rooms = self.store.rooms(&RoomFilter::for_sex(sex))?;
        let ids: Vec<RoomId> = rooms.iter().map(|r| r.id).collect();
        let counts: HashMap<RoomId, CapacityCount> = self
            .store
            .capacity_summary(&ids)?
            .into_iter()
            .map(|c| (c.room_id, c))
            .collect();

        Ok(rooms
            .into_iter()
            .filter_map(|room| {
                let count = counts.get(&room.id).copied()?;
                (count.free() > 0).then_some((room, count))
            })
            .min_by(|(ra, ca), (rb, cb)| {
                cb.free()
                    .cmp(&ca.free())
                    .then_with(|| ra.code.cmp(&rb.code))
            }))
    }

    fn eligible_occupant(&self, occupant_id: OccupantId) -> AllocResult<Occupant> {
        self.directory
            .get_occupant(occupant_id)
            .filter(|o| o.active)
            .ok_or(AllocError::OccupantNotEligible(occupant_id))
    }
}

/// Maps store constraint violations onto domain errors.
fn translate(err: StoreError) -> AllocError {
    let StoreError::ConstraintViolation { constraint } = err else {
        return err.into();
    };
    match constraint {
        Constraint::SlotOccupied { slot } => AllocError::SlotOccupied {
            slot,
            occupant: None,
        },
        Constraint::SlotFree { slot } => AllocError::SlotAlreadyFree { slot },
        Constraint::OccupantHasActiveSlot { occupant, slot } => {
            AllocError::OccupantAlreadyAssigned { occupant, slot }
        }
        Constraint::DuplicateRoomCode { code } => {
            AllocError::validation(format!("room code {code:?} is already in use"))
        }
        Constraint::RoomHasSlots { room } => AllocError::RoomSexLocked { room },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::error::ErrorKind;
    use bedline_model::{AssignmentStatus, SlotState};
    use bedline_store::{InMemoryStore, StoreConfig};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    type Engine = AllocationEngine<InMemoryStore, InMemoryDirectory>;

    const MAN_1: OccupantId = OccupantId::new(1);
    const MAN_2: OccupantId = OccupantId::new(2);
    const MAN_3: OccupantId = OccupantId::new(3);
    const WOMAN: OccupantId = OccupantId::new(10);
    const GONE: OccupantId = OccupantId::new(20);

    fn engine_with(store: InMemoryStore) -> Engine {
        let directory = InMemoryDirectory::from_occupants([
            Occupant::new(MAN_1, Sex::Male).with_name("Luis", "Pardo"),
            Occupant::new(MAN_2, Sex::Male).with_name("Jorge", "Mesa"),
            Occupant::new(MAN_3, Sex::Male).with_name("Pedro", "Gil"),
            Occupant::new(WOMAN, Sex::Female).with_name("Ana", "Rojas"),
            Occupant::new(GONE, Sex::Male).inactive(),
        ]);
        AllocationEngine::new(Arc::new(store), Arc::new(directory))
    }

    fn engine() -> Engine {
        engine_with(InMemoryStore::new())
    }

    fn room_with_bunks(engine: &Engine, code: &str, sex: Sex, bunks: u32) -> Room {
        let room = engine.create_room(RoomSpec::new(code, sex, Some(1))).unwrap();
        engine.generate_capacity(room.id, bunks).unwrap();
        room
    }

    fn slot_by_code(engine: &Engine, room: RoomId, code: &str) -> Slot {
        engine
            .store()
            .slots_for_room(room)
            .unwrap()
            .into_iter()
            .find(|s| s.code == code)
            .unwrap()
    }

    fn states(engine: &Engine, room: RoomId) -> Vec<SlotState> {
        engine
            .store()
            .slots_for_room(room)
            .unwrap()
            .iter()
            .map(Slot::state)
            .collect()
    }

    #[test]
    fn scenario_a_auto_assign_single_room() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 2);
        assert_eq!(engine.store().slots_for_room(room.id).unwrap().len(), 6);

        let first = engine.auto_assign(&Caller::system(), MAN_1).unwrap();
        assert_eq!(first.code, "H-101-L1-C1");
        let second = engine.auto_assign(&Caller::system(), MAN_2).unwrap();
        assert_eq!(second.code, "H-101-L1-C2");
    }

    #[test]
    fn auto_assign_spreads_across_rooms() {
        let engine = engine();
        room_with_bunks(&engine, "H-101", Sex::Male, 2);
        room_with_bunks(&engine, "H-102", Sex::Male, 2);

        // Equal free counts: lowest code wins.
        let first = engine.auto_assign(&Caller::system(), MAN_1).unwrap();
        assert_eq!(first.code, "H-101-L1-C1");
        // H-102 now has more free slots.
        let second = engine.auto_assign(&Caller::system(), MAN_2).unwrap();
        assert_eq!(second.code, "H-102-L1-C1");
        let third = engine.auto_assign(&Caller::system(), MAN_3).unwrap();
        assert_eq!(third.code, "H-101-L1-C2");
    }

    #[test]
    fn auto_assign_skips_inactive_and_other_sex_rooms() {
        let engine = engine();
        room_with_bunks(&engine, "A-1", Sex::Female, 3);
        let closed = room_with_bunks(&engine, "B-1", Sex::Male, 3);
        engine.set_room_active(closed.id, false).unwrap();
        room_with_bunks(&engine, "C-1", Sex::Male, 1);

        let slot = engine.auto_assign(&Caller::system(), MAN_1).unwrap();
        assert_eq!(slot.code, "C-1-L1-C1");
    }

    #[test]
    fn auto_assign_without_capacity() {
        let engine = engine();
        room_with_bunks(&engine, "M-1", Sex::Female, 1);

        let err = engine.auto_assign(&Caller::system(), MAN_1).unwrap_err();
        assert!(matches!(err, AllocError::NoCapacity { sex: Sex::Male }));
        assert_eq!(err.kind(), ErrorKind::Capacity);
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn auto_assign_fills_room_then_reports_no_capacity() {
        let engine = engine();
        let config = EngineConfig::new().slots_per_bunk(1);
        let engine = AllocationEngine::with_config(
            Arc::clone(engine.store()),
            Arc::clone(engine.directory()),
            config,
        );
        room_with_bunks(&engine, "H-1", Sex::Male, 2);

        engine.auto_assign(&Caller::system(), MAN_1).unwrap();
        engine.auto_assign(&Caller::system(), MAN_2).unwrap();
        assert!(matches!(
            engine.auto_assign(&Caller::system(), MAN_3),
            Err(AllocError::NoCapacity { .. })
        ));
    }

    #[test]
    fn auto_assign_rejects_already_assigned_and_ineligible() {
        let engine = engine();
        room_with_bunks(&engine, "H-1", Sex::Male, 1);
        let held = engine.auto_assign(&Caller::system(), MAN_1).unwrap();

        let err = engine.auto_assign(&Caller::system(), MAN_1).unwrap_err();
        assert!(
            matches!(err, AllocError::OccupantAlreadyAssigned { slot, .. } if slot == held.id)
        );
        assert!(matches!(
            engine.auto_assign(&Caller::system(), GONE),
            Err(AllocError::OccupantNotEligible(_))
        ));
    }

    #[test]
    fn scenario_b_sex_mismatch_leaves_slots_unchanged() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");
        let before = states(&engine, room.id);

        let err = engine
            .assign(&Caller::system(), slot.id, WOMAN)
            .unwrap_err();
        assert!(matches!(
            err,
            AllocError::SexMismatch {
                room_sex: Sex::Male,
                occupant_sex: Sex::Female
            }
        ));
        assert_eq!(err.status_code(), 400);
        assert_eq!(states(&engine, room.id), before);
    }

    #[test]
    fn scenario_c_occupant_already_assigned() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let a = slot_by_code(&engine, room.id, "H-101-L1-C1");
        let b = slot_by_code(&engine, room.id, "H-101-L1-C2");

        engine.assign(&Caller::system(), a.id, MAN_1).unwrap();
        let err = engine.assign(&Caller::system(), b.id, MAN_1).unwrap_err();
        assert!(matches!(
            err,
            AllocError::OccupantAlreadyAssigned { occupant, slot } if occupant == MAN_1 && slot == a.id
        ));
        assert_eq!(err.status_code(), 409);

        assert!(!engine.store().slot(a.id).unwrap().is_free());
        assert!(engine.store().slot(b.id).unwrap().is_free());
    }

    #[test]
    fn scenario_d_release_free_slot() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C3");

        let err = engine.release(&Caller::system(), slot.id).unwrap_err();
        assert!(matches!(err, AllocError::SlotAlreadyFree { .. }));
        assert_eq!(err.status_code(), 409);
        assert!(err.user_message().contains("refresh"));
    }

    #[test]
    fn assign_release_round_trip() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");

        let assigned = engine
            .assign(&Caller::staff("maria"), slot.id, MAN_1)
            .unwrap();
        assert_eq!(assigned.occupant_id(), Some(MAN_1));
        assert!(assigned.assigned_at().is_some());

        let released = engine.release(&Caller::staff("jose"), slot.id).unwrap();
        assert!(released.is_free());
        assert_eq!(released.occupant_id(), None);

        let history = engine.store().assignment_history(slot.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, AssignmentStatus::Ended);
        assert!(history[0].ended_at.is_some());
        assert_eq!(history[0].assigned_by.as_deref(), Some("maria"));
        assert_eq!(history[0].released_by.as_deref(), Some("jose"));
    }

    #[test]
    fn assign_occupied_slot() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");
        engine.assign(&Caller::system(), slot.id, MAN_1).unwrap();

        let err = engine.assign(&Caller::system(), slot.id, MAN_2).unwrap_err();
        assert!(matches!(
            err,
            AllocError::SlotOccupied { occupant: Some(o), .. } if o == MAN_1
        ));
    }

    #[test]
    fn assign_unknown_slot_and_ineligible_occupants() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");

        let err = engine
            .assign(&Caller::system(), SlotId::new(999), MAN_1)
            .unwrap_err();
        assert!(matches!(err, AllocError::SlotNotFound(_)));
        assert_eq!(err.status_code(), 404);

        let err = engine.assign(&Caller::system(), slot.id, GONE).unwrap_err();
        assert!(matches!(err, AllocError::OccupantNotEligible(_)));
        assert_eq!(err.status_code(), 404);
        assert!(matches!(
            engine.assign(&Caller::system(), slot.id, OccupantId::new(404)),
            Err(AllocError::OccupantNotEligible(_))
        ));
    }

    #[test]
    fn assign_into_inactive_room_is_rejected() {
        let engine = engine();
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        engine.set_room_active(room.id, false).unwrap();
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");

        let err = engine.assign(&Caller::system(), slot.id, MAN_1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(engine.store().slot(slot.id).unwrap().is_free());
    }

    #[test]
    fn release_unknown_slot() {
        let engine = engine();
        assert!(matches!(
            engine.release(&Caller::system(), SlotId::new(1)),
            Err(AllocError::SlotNotFound(_))
        ));
    }

    #[test]
    fn generate_capacity_is_idempotent_and_additive() {
        let engine = engine();
        let room = engine
            .create_room(RoomSpec::new("H-101", Sex::Male, None))
            .unwrap();

        let first = engine.generate_capacity(room.id, 2).unwrap();
        assert_eq!((first.requested, first.created), (6, 6));

        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");
        engine.assign(&Caller::system(), slot.id, MAN_1).unwrap();

        let again = engine.generate_capacity(room.id, 2).unwrap();
        assert_eq!(again.created, 0);
        assert!(!engine.store().slot(slot.id).unwrap().is_free());

        let grown = engine.generate_capacity(room.id, 3).unwrap();
        assert_eq!(grown.created, 3);
        let shrink = engine.generate_capacity(room.id, 1).unwrap();
        assert_eq!(shrink.created, 0);
        assert_eq!(engine.store().room(room.id).unwrap().bunk_capacity, 3);
        assert_eq!(engine.store().slots_for_room(room.id).unwrap().len(), 9);
    }

    #[test]
    fn generate_capacity_validation() {
        let engine = engine();
        let room = engine
            .create_room(RoomSpec::new("H-101", Sex::Male, None))
            .unwrap();
        let err = engine.generate_capacity(room.id, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            engine.generate_capacity(RoomId::new(77), 1),
            Err(AllocError::RoomNotFound(_))
        ));
    }

    #[test]
    fn room_registry_rules() {
        let engine = engine();
        let room = engine
            .create_room(RoomSpec::new("H-101", Sex::Male, None))
            .unwrap();

        let dup = engine
            .create_room(RoomSpec::new(" H-101 ", Sex::Female, None))
            .unwrap_err();
        assert_eq!(dup.status_code(), 400);

        let changed = engine.change_room_sex(room.id, Sex::Female).unwrap();
        assert_eq!(changed.sex, Sex::Female);

        engine.generate_capacity(room.id, 1).unwrap();
        let err = engine.change_room_sex(room.id, Sex::Male).unwrap_err();
        assert!(matches!(err, AllocError::RoomSexLocked { .. }));
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn lock_timeout_surfaces_as_retryable() {
        let store =
            InMemoryStore::with_config(StoreConfig::new().lock_timeout(Duration::from_millis(20)));
        let engine = engine_with(store);
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot = slot_by_code(&engine, room.id, "H-101-L1-C1");

        let _held = engine.store().lock_slot(slot.id).unwrap();
        let err = engine.assign(&Caller::system(), slot.id, MAN_1).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn concurrent_assign_same_slot_has_one_winner() {
        let engine = Arc::new(engine());
        let room = room_with_bunks(&engine, "H-101", Sex::Male, 1);
        let slot_id = slot_by_code(&engine, room.id, "H-101-L1-C1").id;

        let contenders = [MAN_1, MAN_2, MAN_3];
        let barrier = Arc::new(Barrier::new(contenders.len()));
        let handles: Vec<_> = contenders
            .into_iter()
            .map(|occupant| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    engine.assign(&Caller::system(), slot_id, occupant)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AllocError::SlotOccupied { .. })));

        let stored = engine.store().slot(slot_id).unwrap();
        assert_eq!(stored.occupant_id(), winners[0].occupant_id());
    }
}
