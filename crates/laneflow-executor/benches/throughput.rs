use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use laneflow_executor::{
    MultilaneConfig, MultilaneExecutor, SingleQueueConfig, SingleQueueExecutor,
};

fn drain_single_queue(executor: Arc<SingleQueueExecutor>, messages: u64) {
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..messages {
        let counter = Arc::clone(&counter);
        executor
            .execute(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
    }
    executor.shutdown();
    executor.await_termination(Duration::from_secs(30));
    executor.join_workers();
}

fn drain_multilane(executor: Arc<MultilaneExecutor>, messages: u64) {
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..messages {
        let counter = Arc::clone(&counter);
        executor
            .execute(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
    }
    executor.shutdown();
    executor.await_termination(Duration::from_secs(30));
    executor.join_workers();
}

fn bench_sustained_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("sustained_ping_count");

    for &messages in &[10_000u64, 100_000u64] {
        group.throughput(Throughput::Elements(messages));

        group.bench_with_input(
            BenchmarkId::new("single_queue", messages),
            &messages,
            |b, &messages| {
                b.iter_batched(
                    || {
                        SingleQueueExecutor::new(SingleQueueConfig {
                            pool_size: 4,
                            ..Default::default()
                        })
                    },
                    |executor| drain_single_queue(executor, messages),
                    BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("multilane", messages),
            &messages,
            |b, &messages| {
                b.iter_batched(
                    || {
                        MultilaneExecutor::new(MultilaneConfig {
                            pool_size: 4,
                            ..Default::default()
                        })
                    },
                    |executor| drain_multilane(executor, messages),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sustained_throughput);
criterion_main!(benches);
