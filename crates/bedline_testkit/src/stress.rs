//! Concurrency harnesses.
//!
//! These drive the engine from many threads at once to check that slot
//! locks and commit-time constraints hold under contention.

use crate::fixtures::TestShelter;
use bedline_core::{AllocError, AllocResult, AllocationEngine, BeneficiaryDirectory, Caller};
use bedline_model::{OccupantId, Slot, SlotId};
use bedline_store::OccupancyStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Results of a set of requests released at the same instant.
#[derive(Debug, Default)]
pub struct RaceOutcome {
    /// Requests that committed, with the slot they got.
    pub winners: Vec<(OccupantId, Slot)>,
    /// Requests that lost with a conflict.
    pub conflicts: Vec<AllocError>,
    /// Requests that failed any other way.
    pub other: Vec<AllocError>,
}

impl RaceOutcome {
    fn record(&mut self, occupant: OccupantId, result: AllocResult<Slot>) {
        match result {
            Ok(slot) => self.winners.push((occupant, slot)),
            Err(err) if err.is_stale_view() => self.conflicts.push(err),
            Err(err) => self.other.push(err),
        }
    }

    /// Total number of requests.
    pub fn total(&self) -> usize {
        self.winners.len() + self.conflicts.len() + self.other.len()
    }
}

/// Sends one `assign(slot, occupant)` per occupant, all released at once
/// by a barrier.
pub fn race_assign<S, D>(
    engine: &AllocationEngine<S, D>,
    slot: SlotId,
    occupants: &[OccupantId],
) -> RaceOutcome
where
    S: OccupancyStore,
    D: BeneficiaryDirectory,
{
    race(occupants, |occupant| {
        engine.assign(&Caller::system(), slot, occupant)
    })
}

/// Sends one `auto_assign(occupant)` per occupant, all released at once.
pub fn race_auto_assign<S, D>(
    engine: &AllocationEngine<S, D>,
    occupants: &[OccupantId],
) -> RaceOutcome
where
    S: OccupancyStore,
    D: BeneficiaryDirectory,
{
    race(occupants, |occupant| {
        engine.auto_assign(&Caller::system(), occupant)
    })
}

/// Sends `assign(slot, occupant)` for every slot with the same occupant,
/// all released at once.
pub fn race_same_occupant<S, D>(
    engine: &AllocationEngine<S, D>,
    slots: &[SlotId],
    occupant: OccupantId,
) -> RaceOutcome
where
    S: OccupancyStore,
    D: BeneficiaryDirectory,
{
    let barrier = Barrier::new(slots.len());
    let mut outcome = RaceOutcome::default();
    thread::scope(|scope| {
        let handles: Vec<_> = slots
            .iter()
            .map(|&slot| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    engine.assign(&Caller::system(), slot, occupant)
                })
            })
            .collect();
        for handle in handles {
            outcome.record(occupant, handle.join().expect("Thread panicked"));
        }
    });
    outcome
}

fn race<F>(occupants: &[OccupantId], request: F) -> RaceOutcome
where
    F: Fn(OccupantId) -> AllocResult<Slot> + Sync,
{
    let barrier = Barrier::new(occupants.len());
    let mut outcome = RaceOutcome::default();
    thread::scope(|scope| {
        let handles: Vec<_> = occupants
            .iter()
            .map(|&occupant| {
                let barrier = &barrier;
                let request = &request;
                scope.spawn(move || {
                    barrier.wait();
                    (occupant, request(occupant))
                })
            })
            .collect();
        for handle in handles {
            let (occupant, result) = handle.join().expect("Thread panicked");
            outcome.record(occupant, result);
        }
    });
    outcome
}

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Operations that committed.
    pub successful_ops: usize,
    /// Operations rejected by a business rule or lost race.
    pub rejected_ops: usize,
    /// Operations that failed with a server-side error.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, rejected: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + rejected + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            rejected_ops: rejected,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Rejected: {}", self.rejected_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Base RNG seed; thread `t` uses `seed + t`.
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 500,
            threads: 4,
            seed: 42,
        }
    }
}

/// Runs random assign, release and auto-assign calls from many threads.
///
/// Slots and occupants are drawn from what the shelter holds when the run
/// starts.
pub fn stress_concurrent_churn(
    shelter: Arc<TestShelter>,
    occupants: &[OccupantId],
    config: &StressConfig,
) -> StressTestResult {
    let slots: Arc<Vec<SlotId>> = Arc::new(shelter.all_slots().iter().map(|s| s.id).collect());
    let occupants: Arc<Vec<OccupantId>> = Arc::new(occupants.to_vec());
    if slots.is_empty() || occupants.is_empty() {
        return StressTestResult::new(0, 0, 0, Duration::ZERO);
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let rejected = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let shelter = Arc::clone(&shelter);
            let slots = Arc::clone(&slots);
            let occupants = Arc::clone(&occupants);
            let successful = Arc::clone(&successful);
            let rejected = Arc::clone(&rejected);
            let failed = Arc::clone(&failed);
            let operations = config.operations;
            let seed = config.seed.wrapping_add(t as u64);

            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                let caller = Caller::staff(format!("worker-{t}"));
                for _ in 0..operations {
                    let slot = slots[rng.gen_range(0..slots.len())];
                    let occupant = occupants[rng.gen_range(0..occupants.len())];
                    let result = match rng.gen_range(0..3) {
                        0 => shelter.assign(&caller, slot, occupant),
                        1 => shelter.release(&caller, slot),
                        _ => shelter.auto_assign(&caller, occupant),
                    };
                    let counter = match result {
                        Ok(_) => &successful,
                        Err(err) if err.is_client_error() => &rejected,
                        Err(_) => &failed,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        rejected.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedline_model::Sex;

    #[test]
    fn race_on_one_slot() {
        let shelter = TestShelter::new();
        shelter.add_room("H-101", Sex::Male, 1);
        let men = shelter.add_occupants(Sex::Male, 4);

        let outcome = race_assign(shelter.engine(), shelter.slot("H-101-L1-C1").id, &men);
        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.conflicts.len(), 3);
        assert!(outcome.other.is_empty());
    }

    #[test]
    fn churn_counts_every_operation() {
        let shelter = Arc::new(TestShelter::new());
        shelter.add_room("H-101", Sex::Male, 2);
        let men = shelter.add_occupants(Sex::Male, 8);
        let config = StressConfig {
            operations: 50,
            threads: 3,
            seed: 7,
        };

        let result = stress_concurrent_churn(Arc::clone(&shelter), &men, &config);
        assert_eq!(result.total_ops, 150);
        assert_eq!(result.failed_ops, 0);
    }
}
