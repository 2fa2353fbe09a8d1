//! Benchmark utilities.

use bedline_core::{AllocationEngine, InMemoryDirectory, Occupant};
use bedline_model::{OccupantId, RoomSpec, Sex};
use bedline_store::InMemoryStore;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Engine type used by the benchmarks.
pub type BenchEngine = AllocationEngine<InMemoryStore, InMemoryDirectory>;

/// Builds a shelter of `rooms` male rooms with `bunks` bunks each, and
/// `occupants` male occupants with random names.
pub fn build_shelter(rooms: usize, bunks: u32, occupants: usize) -> (BenchEngine, Vec<OccupantId>) {
    let mut rng = rand::thread_rng();
    let people: Vec<Occupant> = (1..=occupants as u64)
        .map(|id| {
            Occupant::new(OccupantId::new(id), Sex::Male)
                .with_name(random_name(&mut rng), random_name(&mut rng))
                .with_document(format!("{:08}", rng.gen_range(0..100_000_000u32)))
        })
        .collect();
    let ids = people.iter().map(|o| o.id).collect();

    let engine = AllocationEngine::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryDirectory::from_occupants(people)),
    );
    for i in 0..rooms {
        let room = engine
            .create_room(RoomSpec::new(format!("H-{i:03}"), Sex::Male, None))
            .expect("create room");
        engine
            .generate_capacity(room.id, bunks)
            .expect("generate capacity");
    }
    (engine, ids)
}

/// Returns the IDs in random order.
pub fn shuffled(ids: &[OccupantId]) -> Vec<OccupantId> {
    let mut ids = ids.to_vec();
    ids.shuffle(&mut rand::thread_rng());
    ids
}

fn random_name(rng: &mut impl Rng) -> String {
    const SYLLABLES: [&str; 8] = ["ma", "ri", "lu", "jo", "an", "ca", "pe", "so"];
    (0..3)
        .map(|_| SYLLABLES[rng.gen_range(0..SYLLABLES.len())])
        .collect()
}
