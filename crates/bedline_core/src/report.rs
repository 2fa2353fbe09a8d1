//! Read-only capacity projections.
//!
//! Nothing here takes a slot lock. Each listing is read from one store
//! snapshot, so counts and rows agree with each other, but they may be
//! stale by the time the caller acts on them.

use crate::directory::{BeneficiaryDirectory, Occupant, OccupantQuery};
use crate::error::AllocResult;
use bedline_model::{AssignmentRecord, OccupantId, RoomId, Sex, Slot, SlotId, SlotState};
use bedline_store::{OccupancyStore, RoomFilter};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Counts and metadata for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    /// Room ID.
    pub room_id: RoomId,
    /// Room code.
    pub code: String,
    /// Sex restriction.
    pub sex: Sex,
    /// Floor.
    pub floor: Option<i32>,
    /// Declared bunks.
    pub bunk_capacity: u32,
    /// Whether the room accepts occupants.
    pub active: bool,
    /// Total slots.
    pub total: u32,
    /// Occupied slots.
    pub occupied: u32,
    /// Free slots.
    pub free: u32,
}

/// Who holds a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupantSummary {
    /// Occupant ID.
    pub id: OccupantId,
    /// Display name.
    pub name: String,
    /// Identity document.
    pub document: Option<String>,
}

/// A slot with its occupant joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    /// Slot ID.
    pub slot_id: SlotId,
    /// Slot code.
    pub code: String,
    /// Bunk number.
    pub bunk: u16,
    /// Position within the bunk.
    pub position: u8,
    /// Occupancy state.
    pub state: SlotState,
    /// The occupant; `None` for free slots.
    pub occupant: Option<OccupantSummary>,
    /// When the current occupant was assigned.
    pub assigned_at: Option<DateTime<Utc>>,
}

/// One bunk and its slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BunkSummary {
    /// Bunk number.
    pub bunk: u16,
    /// Free slots in the bunk.
    pub free: u32,
    /// Occupied slots in the bunk.
    pub occupied: u32,
    /// The bunk's slots, by position.
    pub slots: Vec<SlotView>,
}

/// Builds dashboard and listing projections.
pub struct CapacityReport<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    default_limit: usize,
}

impl<S, D> CapacityReport<S, D>
where
    S: OccupancyStore,
    D: BeneficiaryDirectory,
{
    /// Creates a report builder.
    ///
    /// `default_limit` caps [`available_occupants`](Self::available_occupants)
    /// when the caller gives no limit.
    pub fn new(store: Arc<S>, directory: Arc<D>, default_limit: usize) -> Self {
        Self {
            store,
            directory,
            default_limit,
        }
    }

    /// Per-room counts, ordered by room code.
    ///
    /// Rooms and counts come from one store read.
    pub fn room_summaries(&self, filter: &RoomFilter) -> AllocResult<Vec<RoomSummary>> {
        Ok(self
            .store
            .room_capacity(filter)?
            .into_iter()
            .map(|(room, count)| RoomSummary {
                room_id: room.id,
                code: room.code,
                sex: room.sex,
                floor: room.floor,
                bunk_capacity: room.bunk_capacity,
                active: room.active,
                total: count.total,
                occupied: count.occupied,
                free: count.free(),
            })
            .collect())
    }

    /// A room's slots ordered by bunk then position, with occupants joined.
    pub fn slots_for_room(&self, room_id: RoomId) -> AllocResult<Vec<SlotView>> {
        Ok(self
            .store
            .slots_for_room(room_id)?
            .iter()
            .map(|slot| self.view(slot))
            .collect())
    }

    /// A room's slots grouped by bunk.
    pub fn bunk_summaries(&self, room_id: RoomId) -> AllocResult<Vec<BunkSummary>> {
        let mut bunks: Vec<BunkSummary> = Vec::new();
        for view in self.slots_for_room(room_id)? {
            if bunks.last().map_or(true, |b| b.bunk != view.bunk) {
                bunks.push(BunkSummary {
                    bunk: view.bunk,
                    free: 0,
                    occupied: 0,
                    slots: Vec::new(),
                });
            }
            if let Some(bunk) = bunks.last_mut() {
                match view.state {
                    SlotState::Free => bunk.free += 1,
                    SlotState::Occupied => bunk.occupied += 1,
                }
                bunk.slots.push(view);
            }
        }
        Ok(bunks)
    }

    /// Active beneficiaries without a bed, ordered by first name.
    ///
    /// Returns at most `limit` occupants, or the configured default.
    pub fn available_occupants(
        &self,
        query: &OccupantQuery,
        limit: Option<usize>,
    ) -> AllocResult<Vec<Occupant>> {
        let taken: HashSet<OccupantId> = self.store.assigned_occupants()?.into_iter().collect();
        Ok(self
            .directory
            .search(query)
            .into_iter()
            .filter(|o| !taken.contains(&o.id))
            .take(limit.unwrap_or(self.default_limit))
            .collect())
    }

    /// The slot an occupant currently holds.
    pub fn slot_for_occupant(&self, occupant: OccupantId) -> AllocResult<Option<SlotView>> {
        Ok(self
            .store
            .find_active_slot_for_occupant(occupant)?
            .map(|slot| self.view(&slot)))
    }

    /// Every assignment record for a slot, oldest first.
    pub fn assignment_history(&self, slot_id: SlotId) -> AllocResult<Vec<AssignmentRecord>> {
        Ok(self.store.assignment_history(slot_id)?)
    }

    /// The active assignment record for a slot.
    pub fn active_assignment(&self, slot_id: SlotId) -> AllocResult<Option<AssignmentRecord>> {
        Ok(self.store.active_assignment(slot_id)?)
    }

    fn view(&self, slot: &Slot) -> SlotView {
        let occupant = slot.occupant_id().map(|id| match self.directory.get_occupant(id) {
            Some(o) => OccupantSummary {
                id,
                name: o.display_name(),
                document: o.document,
            },
            None => OccupantSummary {
                id,
                name: id.to_string(),
                document: None,
            },
        });
        SlotView {
            slot_id: slot.id,
            code: slot.code.clone(),
            bunk: slot.bunk(),
            position: slot.position(),
            state: slot.state(),
            occupant,
            assigned_at: slot.assigned_at(),
        }
    }
}
