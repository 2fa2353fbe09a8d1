//! Assignment records: the audit trail of occupancy.

use crate::ids::{AssignmentId, OccupantId, SlotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an assignment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    /// The occupant currently holds the slot.
    Active,
    /// The assignment was closed by a release.
    Ended,
}

/// A time-bounded binding of an occupant to a slot.
///
/// At most one `Active` record exists per slot, and it always agrees with
/// the slot's denormalized occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Record ID.
    pub id: AssignmentId,
    /// Slot held.
    pub slot_id: SlotId,
    /// Occupant holding it.
    pub occupant_id: OccupantId,
    /// Current status.
    pub status: AssignmentStatus,
    /// When the assignment started.
    pub started_at: DateTime<Utc>,
    /// When the assignment ended; set together with `status = Ended`.
    pub ended_at: Option<DateTime<Utc>>,
    /// Caller that made the assignment.
    pub assigned_by: Option<String>,
    /// Caller that released the slot.
    pub released_by: Option<String>,
}

impl AssignmentRecord {
    /// Opens a new active record.
    pub fn open(
        slot_id: SlotId,
        occupant_id: OccupantId,
        started_at: DateTime<Utc>,
        assigned_by: Option<String>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            slot_id,
            occupant_id,
            status: AssignmentStatus::Active,
            started_at,
            ended_at: None,
            assigned_by,
            released_by: None,
        }
    }

    /// Returns true while the record is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Closes the record. Closing an already-ended record keeps the first
    /// end stamp.
    pub fn close(&mut self, ended_at: DateTime<Utc>, released_by: Option<String>) {
        if self.is_active() {
            self.status = AssignmentStatus::Ended;
            self.ended_at = Some(ended_at);
            self.released_by = released_by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn close_stamps_end() {
        let start = Utc::now();
        let mut record =
            AssignmentRecord::open(SlotId::new(1), OccupantId::new(2), start, Some("ana".into()));
        assert!(record.is_active());

        let end = start + Duration::hours(8);
        record.close(end, Some("luis".into()));
        assert_eq!(record.status, AssignmentStatus::Ended);
        assert_eq!(record.ended_at, Some(end));
        assert_eq!(record.released_by.as_deref(), Some("luis"));
    }

    #[test]
    fn close_is_sticky() {
        let start = Utc::now();
        let mut record = AssignmentRecord::open(SlotId::new(1), OccupantId::new(2), start, None);
        record.close(start, None);
        record.close(start + Duration::days(1), Some("late".into()));
        assert_eq!(record.ended_at, Some(start));
        assert_eq!(record.released_by, None);
    }
}
