//! Occupancy store trait definitions.

use crate::error::StoreResult;
use bedline_model::{
    AssignmentRecord, OccupantId, Room, RoomId, RoomSpec, Sex, Slot, SlotDescriptor, SlotId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-room slot counts, computed in one pass over a consistent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCount {
    /// The room.
    pub room_id: RoomId,
    /// Total number of slots.
    pub total: u32,
    /// Number of occupied slots.
    pub occupied: u32,
}

impl CapacityCount {
    /// Number of free slots.
    #[must_use]
    pub const fn free(&self) -> u32 {
        self.total.saturating_sub(self.occupied)
    }
}

/// Room selection for listing queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomFilter {
    /// Only rooms with this sex restriction.
    pub sex: Option<Sex>,
    /// Include deactivated rooms.
    pub include_inactive: bool,
}

impl RoomFilter {
    /// Active rooms of any sex.
    #[must_use]
    pub const fn active() -> Self {
        Self {
            sex: None,
            include_inactive: false,
        }
    }

    /// Active rooms restricted to `sex`.
    #[must_use]
    pub const fn for_sex(sex: Sex) -> Self {
        Self {
            sex: Some(sex),
            include_inactive: false,
        }
    }

    /// Returns true if `room` passes the filter.
    #[must_use]
    pub fn matches(&self, room: &Room) -> bool {
        (self.include_inactive || room.active) && self.sex.map_or(true, |s| s == room.sex)
    }
}

/// Persistence adapter for rooms, slots and assignment records.
///
/// The store is the only component allowed to mutate slot occupancy, and
/// it does so only through a [`SlotTransaction`] obtained from
/// [`OccupancyStore::lock_slot`].
///
/// # Invariants
///
/// - A slot is occupied iff exactly one active assignment record exists for it
/// - An occupant holds at most one occupied slot
/// - Slot natural keys and room codes are unique
/// - Multi-row writes are atomic
/// - Implementations must be `Send + Sync`
pub trait OccupancyStore: Send + Sync {
    /// Transaction holding the exclusive lock on one slot.
    type Txn<'a>: SlotTransaction
    where
        Self: 'a;

    /// Creates a room.
    ///
    /// # Errors
    ///
    /// Fails with a `DuplicateRoomCode` constraint violation if the code is
    /// already used, or a model error if the room fields are malformed.
    fn create_room(&self, spec: RoomSpec) -> StoreResult<Room>;

    /// Fetches a room.
    ///
    /// # Errors
    ///
    /// Returns `RoomNotFound` if the room does not exist.
    fn room(&self, room_id: RoomId) -> StoreResult<Room>;

    /// Lists rooms passing `filter`, ordered by code.
    fn rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>>;

    /// Activates or deactivates a room.
    fn set_room_active(&self, room_id: RoomId, active: bool) -> StoreResult<Room>;

    /// Changes a room's sex restriction.
    ///
    /// # Errors
    ///
    /// Fails with a `RoomHasSlots` constraint violation once the room has
    /// generated slots.
    fn set_room_sex(&self, room_id: RoomId, sex: Sex) -> StoreResult<Room>;

    /// Inserts slots for a room and raises its declared bunk capacity to at
    /// least `bunk_capacity`, atomically.
    ///
    /// Descriptors whose natural key already exists are skipped, never
    /// overwritten. Returns the number of slots actually created.
    fn insert_slots(
        &self,
        room_id: RoomId,
        slots: &[SlotDescriptor],
        bunk_capacity: u32,
    ) -> StoreResult<usize>;

    /// Fetches a slot.
    fn slot(&self, slot_id: SlotId) -> StoreResult<Slot>;

    /// Returns a room's slots ordered by bunk, then slot position.
    fn slots_for_room(&self, room_id: RoomId) -> StoreResult<Vec<Slot>>;

    /// Returns the lowest-ordinal free slot of a room.
    fn first_free_slot(&self, room_id: RoomId) -> StoreResult<Option<Slot>>;

    /// Returns the slot currently held by `occupant`, if any.
    fn find_active_slot_for_occupant(&self, occupant: OccupantId) -> StoreResult<Option<Slot>>;

    /// Returns every occupant currently holding a slot, in ID order.
    fn assigned_occupants(&self) -> StoreResult<Vec<OccupantId>>;

    /// Returns per-room counts for the given rooms in one pass.
    ///
    /// Unknown room IDs are omitted.
    fn capacity_summary(&self, room_ids: &[RoomId]) -> StoreResult<Vec<CapacityCount>>;

    /// Returns rooms passing `filter` together with their counts, read from
    /// the same snapshot. Ordered by room code.
    fn room_capacity(&self, filter: &RoomFilter) -> StoreResult<Vec<(Room, CapacityCount)>>;

    /// Returns all assignment records for a slot, oldest first.
    fn assignment_history(&self, slot_id: SlotId) -> StoreResult<Vec<AssignmentRecord>>;

    /// Returns the active assignment record for a slot, if any.
    fn active_assignment(&self, slot_id: SlotId) -> StoreResult<Option<AssignmentRecord>>;

    /// Begins a transaction holding the exclusive lock on `slot_id`.
    ///
    /// Waits at most the configured lock timeout.
    ///
    /// # Errors
    ///
    /// - `SlotNotFound` if the slot does not exist
    /// - `LockTimeout` if another transaction held the lock too long
    fn lock_slot(&self, slot_id: SlotId) -> StoreResult<Self::Txn<'_>>;
}

/// An open transaction over one locked slot.
///
/// Dropping the transaction without committing rolls it back and releases
/// the lock.
pub trait SlotTransaction {
    /// The slot as read after the lock was acquired.
    fn slot(&self) -> &Slot;

    /// The room owning the slot, read after the lock was acquired.
    fn room(&self) -> &Room;

    /// Returns the slot currently held by `occupant`, if any.
    fn find_active_slot_for_occupant(&self, occupant: OccupantId) -> StoreResult<Option<Slot>>;

    /// Occupies the slot and opens an active assignment record.
    ///
    /// # Errors
    ///
    /// Fails with `SlotOccupied` or `OccupantHasActiveSlot` constraint
    /// violations if a concurrent transaction won the race.
    fn commit_assign(
        self,
        occupant: OccupantId,
        now: DateTime<Utc>,
        actor: Option<&str>,
    ) -> StoreResult<Slot>;

    /// Frees the slot and closes its active assignment record.
    ///
    /// # Errors
    ///
    /// Fails with a `SlotFree` constraint violation if the slot has no
    /// occupant.
    fn commit_release(self, now: DateTime<Utc>, actor: Option<&str>) -> StoreResult<Slot>;

    /// Abandons the transaction.
    fn rollback(self);
}
