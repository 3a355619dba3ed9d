//! Throughput benchmarks for count_core using Criterion.rs.

use std::thread;

use count_core::test_helpers::InMemoryStore;
use count_core::{count_table, Aggregator, SilentProgress};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_contended_increments(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator_increments");
    for writers in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(writers), &writers, |b, &writers| {
            b.iter(|| {
                let progress = SilentProgress;
                let aggregator = Aggregator::start(Some(1_000_000), &progress);
                thread::scope(|scope| {
                    for _ in 0..writers {
                        scope.spawn(|| {
                            for _ in 0..1_000 {
                                aggregator.record_increment(black_box(3));
                            }
                        });
                    }
                });
                black_box(aggregator.finish())
            });
        });
    }
    group.finish();
}

fn bench_segmented_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmented_count");
    for segments in [1u32, 8, 32] {
        group.bench_with_input(
            BenchmarkId::from_parameter(segments),
            &segments,
            |b, &segments| {
                b.iter(|| {
                    let store = InMemoryStore::new("bench", 200_000);
                    let report = count_table(&store, segments, 500, &SilentProgress)
                        .expect("count should pass");
                    black_box(report.total_count)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_contended_increments, bench_segmented_count);
criterion_main!(benches);
