//! In-memory occupancy store.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::lock::{LockTable, SlotLease};
use crate::snapshot::StoreSnapshot;
use crate::store::{CapacityCount, OccupancyStore, RoomFilter, SlotTransaction};
use crate::tables::Tables;
use bedline_model::{
    AssignmentRecord, OccupantId, Room, RoomId, RoomSpec, Sex, Slot, SlotDescriptor, SlotId,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// An in-memory occupancy store.
///
/// Tables live behind a single reader-writer lock, so every read sees a
/// consistent snapshot and every write is atomic. Slot transactions
/// additionally hold a per-slot lease for their whole lifetime, which
/// serializes competing assign and release calls on the same slot.
///
/// Suitable for:
/// - Unit and integration tests
/// - Single-process deployments persisted through [`StoreSnapshot`]
///
/// # Example
///
/// ```rust
/// use bedline_model::{generate_slots, OccupantId, RoomSpec, Sex};
/// use bedline_store::{InMemoryStore, OccupancyStore, SlotTransaction};
///
/// let store = InMemoryStore::new();
/// let room = store.create_room(RoomSpec::new("H-101", Sex::Male, Some(1))).unwrap();
/// store.insert_slots(room.id, &generate_slots(&room, 1, 3).unwrap(), 1).unwrap();
///
/// let slot = store.first_free_slot(room.id).unwrap().unwrap();
/// let txn = store.lock_slot(slot.id).unwrap();
/// let slot = txn.commit_assign(OccupantId::new(1), chrono::Utc::now(), None).unwrap();
/// assert!(!slot.is_free());
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    config: StoreConfig,
    tables: RwLock<Tables>,
    locks: LockTable,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(Tables::default()),
            locks: LockTable::new(),
        }
    }

    /// Restores a store from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if the snapshot violates occupancy invariants.
    pub fn from_snapshot(snapshot: StoreSnapshot, config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            config,
            tables: RwLock::new(Tables::from_snapshot(snapshot)?),
            locks: LockTable::new(),
        })
    }

    /// Exports every table at a single point in time.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.tables.read().to_snapshot()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl OccupancyStore for InMemoryStore {
    type Txn<'a> = MemorySlotTransaction<'a>;

    fn create_room(&self, spec: RoomSpec) -> StoreResult<Room> {
        self.tables.write().create_room(spec)
    }

    fn room(&self, room_id: RoomId) -> StoreResult<Room> {
        self.tables.read().room(room_id).cloned()
    }

    fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        Ok(self.tables.read().rooms(filter))
    }

    fn set_room_active(&self, room_id: RoomId, active: bool) -> StoreResult<Room> {
        self.tables.write().set_room_active(room_id, active)
    }

    fn set_room_sex(&self, room_id: RoomId, sex: Sex) -> StoreResult<Room> {
        self.tables.write().set_room_sex(room_id, sex)
    }

    fn insert_slots(
        &self,
        room_id: RoomId,
        slots: &[SlotDescriptor],
        bunk_capacity: u32,
    ) -> StoreResult<usize> {
        self.tables
            .write()
            .insert_slots(room_id, slots, bunk_capacity)
    }

    fn slot(&self, slot_id: SlotId) -> StoreResult<Slot> {
        self.tables.read().slot(slot_id).cloned()
    }

    fn slots_for_room(&self, room_id: RoomId) -> StoreResult<Vec<Slot>> {
        let tables = self.tables.read();
        tables.room(room_id)?;
        let slots = tables.slots_in_room(room_id).cloned().collect();
        Ok(slots)
    }

    fn first_free_slot(&self, room_id: RoomId) -> StoreResult<Option<Slot>> {
        let tables = self.tables.read();
        tables.room(room_id)?;
        let free = tables.slots_in_room(room_id).find(|s| s.is_free()).cloned();
        Ok(free)
    }

    fn find_active_slot_for_occupant(&self, occupant: OccupantId) -> StoreResult<Option<Slot>> {
        Ok(self.tables.read().slot_of_occupant(occupant).cloned())
    }

    fn assigned_occupants(&self) -> StoreResult<Vec<OccupantId>> {
        Ok(self.tables.read().assigned_occupants())
    }

    fn capacity_summary(&self, room_ids: &[RoomId]) -> StoreResult<Vec<CapacityCount>> {
        let tables = self.tables.read();
        Ok(room_ids
            .iter()
            .filter(|id| tables.room(**id).is_ok())
            .map(|id| tables.count(*id))
            .collect())
    }

    fn room_capacity(&self, filter: &RoomFilter) -> StoreResult<Vec<(Room, CapacityCount)>> {
        let tables = self.tables.read();
        Ok(tables
            .rooms(filter)
            .into_iter()
            .map(|room| {
                let count = tables.count(room.id);
                (room, count)
            })
            .collect())
    }

    fn assignment_history(&self, slot_id: SlotId) -> StoreResult<Vec<AssignmentRecord>> {
        let tables = self.tables.read();
        tables.slot(slot_id)?;
        Ok(tables.history(slot_id))
    }

    fn active_assignment(&self, slot_id: SlotId) -> StoreResult<Option<AssignmentRecord>> {
        let tables = self.tables.read();
        tables.slot(slot_id)?;
        Ok(tables.active_record(slot_id).cloned())
    }

    fn lock_slot(&self, slot_id: SlotId) -> StoreResult<MemorySlotTransaction<'_>> {
        if !self.tables.read().contains_slot(slot_id) {
            return Err(StoreError::SlotNotFound(slot_id));
        }

        let lease = self
            .locks
            .acquire(slot_id, self.config.lock_timeout)
            .map_err(|waited| {
                warn!(slot = %slot_id, ?waited, "slot lock wait timed out");
                StoreError::LockTimeout {
                    slot: slot_id,
                    waited,
                }
            })?;
        debug!(slot = %slot_id, "slot locked");

        // Re-read under the lease so the transaction starts from fresh state.
        let tables = self.tables.read();
        let slot = tables.slot(slot_id)?.clone();
        let room = tables.room(slot.room_id())?.clone();
        drop(tables);

        Ok(MemorySlotTransaction {
            store: self,
            _lease: lease,
            slot,
            room,
        })
    }
}

/// Transaction over one locked slot of an [`InMemoryStore`].
#[derive(Debug)]
pub struct MemorySlotTransaction<'a> {
    store: &'a InMemoryStore,
    _lease: SlotLease<'a>,
    slot: Slot,
    room: Room,
}

impl SlotTransaction for MemorySlotTransaction<'_> {
    fn slot(&self) -> &Slot {
        &self.slot
    }

    fn room(&self) -> &Room {
        &self.room
    }

    fn find_active_slot_for_occupant(&self, occupant: OccupantId) -> StoreResult<Option<Slot>> {
        self.store.find_active_slot_for_occupant(occupant)
    }

    fn commit_assign(
        self,
        occupant: OccupantId,
        now: DateTime<Utc>,
        actor: Option<&str>,
    ) -> StoreResult<Slot> {
        self.store
            .tables
            .write()
            .occupy(self.slot.id, occupant, now, actor)
    }

    fn commit_release(self, now: DateTime<Utc>, actor: Option<&str>) -> StoreResult<Slot> {
        self.store.tables.write().vacate(self.slot.id, now, actor)
    }

    fn rollback(self) {
        debug!(slot = %self.slot.id, "slot transaction rolled back");
    }
}
