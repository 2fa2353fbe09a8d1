//! Concurrent request tests.

use bedline_core::{AllocError, Caller, EngineConfig};
use bedline_model::{Sex, SlotId};
use bedline_store::{OccupancyStore, StoreConfig};
use bedline_testkit::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn k_assigns_on_one_slot_have_one_winner() {
    for k in [2, 4, 8, 16] {
        let shelter = TestShelter::new();
        shelter.add_room("H-101", Sex::Male, 1);
        let men = shelter.add_occupants(Sex::Male, k);
        let slot = shelter.slot("H-101-L1-C1");

        let outcome = race_assign(shelter.engine(), slot.id, &men);
        assert_eq!(outcome.winners.len(), 1, "k = {k}");
        assert_eq!(outcome.conflicts.len(), k - 1, "k = {k}");
        assert!(outcome
            .conflicts
            .iter()
            .all(|e| matches!(e, AllocError::SlotOccupied { .. })));

        let (winner, _) = outcome.winners[0];
        let stored = shelter.store().slot(slot.id).unwrap();
        assert_eq!(stored.occupant_id(), Some(winner));
        check_invariants(&shelter.snapshot()).unwrap();
    }
}

#[test]
fn one_occupant_on_many_slots_gets_one() {
    let shelter = TestShelter::new();
    shelter.add_room("H-101", Sex::Male, 3);
    let man = shelter.add_occupants(Sex::Male, 1)[0];
    let slots: Vec<SlotId> = shelter.all_slots().iter().map(|s| s.id).collect();

    let outcome = race_same_occupant(shelter.engine(), &slots, man);
    assert_eq!(outcome.winners.len(), 1);
    assert_eq!(outcome.conflicts.len(), slots.len() - 1);
    assert!(outcome
        .conflicts
        .iter()
        .all(|e| matches!(e, AllocError::OccupantAlreadyAssigned { occupant, .. } if *occupant == man)));
    check_invariants(&shelter.snapshot()).unwrap();
}

#[test]
fn concurrent_auto_assign_never_double_books() {
    let shelter = TestShelter::new();
    shelter.add_room("H-101", Sex::Male, 2);
    shelter.add_room("H-102", Sex::Male, 1);
    // 9 slots, 12 people.
    let men = shelter.add_occupants(Sex::Male, 12);

    let outcome = race_auto_assign(shelter.engine(), &men);
    assert_eq!(outcome.total(), 12);
    assert!(outcome.other.iter().all(|e| matches!(e, AllocError::NoCapacity { .. })));

    let taken: HashSet<SlotId> = outcome.winners.iter().map(|(_, s)| s.id).collect();
    assert_eq!(taken.len(), outcome.winners.len());
    assert!(outcome.winners.len() <= 9);
    check_invariants(&shelter.snapshot()).unwrap();
}

#[test]
fn auto_assign_with_spare_capacity_places_everyone() {
    let shelter = TestShelter::with_config(
        StoreConfig::default(),
        EngineConfig::default().auto_assign_retries(10),
    );
    shelter.add_room("H-101", Sex::Male, 4);
    shelter.add_room("H-102", Sex::Male, 4);
    let men = shelter.add_occupants(Sex::Male, 6);

    let outcome = race_auto_assign(shelter.engine(), &men);
    assert_eq!(outcome.winners.len(), 6, "{:?}", outcome);
    check_invariants(&shelter.snapshot()).unwrap();
}

#[test]
fn churn_keeps_invariants() {
    let shelter = Arc::new(TestShelter::with_config(
        StoreConfig::new().lock_timeout(Duration::from_secs(10)),
        EngineConfig::default(),
    ));
    shelter.add_room("H-101", Sex::Male, 2);
    shelter.add_room("H-102", Sex::Male, 1);
    shelter.add_room("M-201", Sex::Female, 1);
    let mut people = shelter.add_occupants(Sex::Male, 10);
    people.extend(shelter.add_occupants(Sex::Female, 4));

    let result = stress_concurrent_churn(
        Arc::clone(&shelter),
        &people,
        &StressConfig {
            operations: 200,
            threads: 4,
            seed: 1234,
        },
    );
    assert_eq!(result.total_ops, 800);
    assert_eq!(result.failed_ops, 0);
    check_invariants(&shelter.snapshot()).unwrap();
}

#[test]
fn winning_caller_is_stamped_on_contended_slot() {
    let shelter = TestShelter::new();
    shelter.add_room("H-101", Sex::Male, 1);
    let men = shelter.add_occupants(Sex::Male, 2);
    let slot_id = shelter.slot("H-101-L1-C1").id;
    let callers = [Caller::staff("night-shift"), Caller::staff("day-shift")];
    let barrier = Barrier::new(callers.len());

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = callers
            .iter()
            .zip(&men)
            .map(|(caller, &man)| {
                let shelter = &shelter;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    (caller, shelter.assign(caller, slot_id, man))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    let (winner, _) = winners[0];

    let active = shelter.report().active_assignment(slot_id).unwrap().unwrap();
    assert_eq!(active.assigned_by.as_deref(), winner.name());
    let history = shelter.report().assignment_history(slot_id).unwrap();
    assert_eq!(history.len(), 1);
}
