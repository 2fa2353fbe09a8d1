//! Assignment throughput benchmarks.

use bedline_bench::{build_shelter, shuffled};
use bedline_core::Caller;
use bedline_store::OccupancyStore;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark an assign followed by a release on the same slot.
fn bench_assign_release(c: &mut Criterion) {
    let (engine, occupants) = build_shelter(1, 1, 1);
    let room = engine
        .store()
        .rooms(&Default::default())
        .unwrap()
        .remove(0);
    let slot = engine.store().first_free_slot(room.id).unwrap().unwrap();
    let caller = Caller::staff("bench");

    c.bench_function("assign_release", |b| {
        b.iter(|| {
            engine
                .assign(&caller, black_box(slot.id), occupants[0])
                .unwrap();
            engine.release(&caller, slot.id).unwrap();
        });
    });
}

/// Benchmark filling a shelter through auto-assign.
fn bench_auto_assign_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_assign_fill");

    for rooms in [1usize, 10, 50].iter() {
        let occupants = rooms * 9;
        group.throughput(Throughput::Elements(occupants as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rooms), rooms, |b, &rooms| {
            b.iter_with_setup(
                || build_shelter(rooms, 3, occupants),
                |(engine, ids)| {
                    let caller = Caller::system();
                    for id in shuffled(&ids) {
                        engine.auto_assign(&caller, black_box(id)).unwrap();
                    }
                },
            );
        });
    }
    group.finish();
}

/// Benchmark a rejected assign (the occupant already holds a slot).
fn bench_rejected_assign(c: &mut Criterion) {
    let (engine, occupants) = build_shelter(1, 1, 1);
    let caller = Caller::system();
    engine.auto_assign(&caller, occupants[0]).unwrap();
    let room = engine
        .store()
        .rooms(&Default::default())
        .unwrap()
        .remove(0);
    let free = engine.store().first_free_slot(room.id).unwrap().unwrap();

    c.bench_function("rejected_assign", |b| {
        b.iter(|| {
            let result = engine.assign(&caller, black_box(free.id), occupants[0]);
            assert!(result.is_err());
        });
    });
}

criterion_group!(
    benches,
    bench_assign_release,
    bench_auto_assign_fill,
    bench_rejected_assign
);
criterion_main!(benches);
