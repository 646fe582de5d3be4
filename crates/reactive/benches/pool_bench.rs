//! Benchmarks for the subscription pool using criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use futures::executor::LocalPool;
use rill_core::{Folder, Query};
use rill_reactive::{Bridge, Disposable, ObservableExt, SubscriptionPool};
use rill_store::MemoryStore;
use std::rc::Rc;

fn populated_store(size: u64) -> Rc<MemoryStore> {
    let store = Rc::new(MemoryStore::new());
    store.put_all((0..size).map(|i| {
        Folder::new(i, &format!("a{}", i % 8), &format!("Folder {}", i)).to_record()
    }));
    store
}

fn pool_subscribe_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_subscribe_shared");

    for listeners in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(listeners),
            listeners,
            |b, &listeners| {
                let store = populated_store(100);
                b.iter(|| {
                    let mut executor = LocalPool::new();
                    let pool = SubscriptionPool::new(store.clone(), Rc::new(executor.spawner()));
                    let bridge = Bridge::new(pool.clone());
                    let handles: Vec<Disposable> = (0..listeners)
                        .map(|_| bridge.from_query(Query::<Folder>::all()).subscribe(|_| {}))
                        .collect();
                    executor.run_until_stalled();
                    black_box(pool.ref_count(&Query::<Folder>::all()));
                    handles.iter().for_each(Disposable::dispose);
                });
            },
        );
    }

    group.finish();
}

fn mutation_fanout_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation_fanout");

    for queries in [8, 64, 256].iter() {
        let store = populated_store(1000);
        let mut executor = LocalPool::new();
        let pool = SubscriptionPool::new(store.clone(), Rc::new(executor.spawner()));
        let bridge = Bridge::new(pool);
        let _handles: Vec<Disposable> = (0..*queries)
            .map(|i| {
                let query = Query::<Folder>::all()
                    .where_eq("account_id", format!("a{}", i % 8))
                    .limit(i as usize + 1);
                bridge.from_query(query).subscribe(|_| {})
            })
            .collect();
        executor.run_until_stalled();

        group.bench_with_input(BenchmarkId::from_parameter(queries), queries, |b, _| {
            let mut next_id = 10_000u64;
            b.iter(|| {
                next_id += 1;
                store.put(Folder::new(next_id, "a0", "Scratch").to_record());
                executor.run_until_stalled();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, pool_subscribe_benchmark, mutation_fanout_benchmark);
criterion_main!(benches);
