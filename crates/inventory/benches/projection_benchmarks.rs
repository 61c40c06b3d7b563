//! Benchmarks for the search projection over large snapshots.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use stockroom_core::ItemName;
use stockroom_inventory::{InventoryItem, InventorySnapshot, filter};

fn build_snapshot(size: usize) -> InventorySnapshot {
    (0..size)
        .map(|i| {
            let name = ItemName::parse(&format!("item-{i:06}")).expect("valid name");
            InventoryItem::new(name, (i as u64 % 50) + 1).expect("positive quantity")
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100usize, 1_000, 10_000] {
        let snapshot = build_snapshot(size);

        group.bench_with_input(BenchmarkId::new("empty_query", size), &snapshot, |b, s| {
            b.iter(|| filter(black_box(s), black_box("")))
        });

        group.bench_with_input(BenchmarkId::new("selective_query", size), &snapshot, |b, s| {
            b.iter(|| filter(black_box(s), black_box("ITEM-0001")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
