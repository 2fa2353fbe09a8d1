//! Row-level slot locks.

use bedline_model::SlotId;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Table of currently held slot locks.
///
/// Each slot can be held by at most one [`SlotLease`]. Waiters block on a
/// shared condition variable and give up at a deadline.
#[derive(Debug, Default)]
pub(crate) struct LockTable {
    held: Mutex<HashSet<SlotId>>,
    released: Condvar,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock on `slot`, waiting at most `timeout`.
    ///
    /// Returns the time spent waiting on failure.
    pub(crate) fn acquire(&self, slot: SlotId, timeout: Duration) -> Result<SlotLease<'_>, Duration> {
        let start = Instant::now();
        let deadline = start + timeout;
        let mut held = self.held.lock();
        while held.contains(&slot) {
            if self.released.wait_until(&mut held, deadline).timed_out() && held.contains(&slot) {
                return Err(start.elapsed());
            }
        }
        held.insert(slot);
        Ok(SlotLease { table: self, slot })
    }

    #[cfg(test)]
    fn is_held(&self, slot: SlotId) -> bool {
        self.held.lock().contains(&slot)
    }
}

/// Exclusive hold on one slot; released on drop.
#[derive(Debug)]
pub(crate) struct SlotLease<'a> {
    table: &'a LockTable,
    slot: SlotId,
}

impl Drop for SlotLease<'_> {
    fn drop(&mut self) {
        self.table.held.lock().remove(&self.slot);
        self.table.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn lease_released_on_drop() {
        let table = LockTable::new();
        let slot = SlotId::new(1);
        {
            let _lease = table.acquire(slot, Duration::from_millis(10)).unwrap();
            assert!(table.is_held(slot));
        }
        assert!(!table.is_held(slot));
    }

    #[test]
    fn second_acquire_times_out() {
        let table = LockTable::new();
        let slot = SlotId::new(1);
        let _lease = table.acquire(slot, Duration::from_millis(10)).unwrap();
        let waited = table.acquire(slot, Duration::from_millis(20)).unwrap_err();
        assert!(waited >= Duration::from_millis(20));
    }

    #[test]
    fn different_slots_do_not_block() {
        let table = LockTable::new();
        let _a = table.acquire(SlotId::new(1), Duration::ZERO).unwrap();
        assert!(table.acquire(SlotId::new(2), Duration::ZERO).is_ok());
    }

    #[test]
    fn waiter_wakes_when_lease_dropped() {
        let table = Arc::new(LockTable::new());
        let slot = SlotId::new(7);
        let lease = table.acquire(slot, Duration::ZERO).unwrap();

        let waiter = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let acquired = table.acquire(slot, Duration::from_secs(5)).is_ok();
                acquired
            })
        };
        thread::sleep(Duration::from_millis(20));
        drop(lease);
        assert!(waiter.join().unwrap());
    }
}
