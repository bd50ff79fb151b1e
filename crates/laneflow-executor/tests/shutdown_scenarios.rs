use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use laneflow_executor::{
    MultilaneConfig, MultilaneExecutor, SingleQueueConfig, SingleQueueExecutor,
};

#[test]
fn single_queue_shutdown_now_accounts_for_every_task() {
    let executor = SingleQueueExecutor::new(SingleQueueConfig {
        pool_size: 4,
        ..Default::default()
    });

    let completed = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Barrier::new(2));
    let release_worker = Arc::clone(&release);

    // One task blocks a worker until we say so, giving the remaining 999 a
    // chance to queue up before shutdown_now runs.
    executor
        .execute(Box::new(move || {
            release_worker.wait();
        }))
        .unwrap();

    for _ in 0..999 {
        let completed = Arc::clone(&completed);
        let _ = executor.execute(Box::new(move || {
            completed.fetch_add(1, Ordering::Relaxed);
        }));
    }

    let drained = executor.shutdown_now();
    release.wait();

    assert!(executor.await_termination(Duration::from_secs(30)));
    executor.join_workers();

    // Every task was either completed or returned undrained; none vanished.
    assert_eq!(drained.len() + completed.load(Ordering::Relaxed), 999);
}

#[test]
fn multilane_shutdown_now_accounts_for_every_task() {
    let executor = MultilaneExecutor::new(MultilaneConfig {
        pool_size: 4,
        ..Default::default()
    });

    let completed = Arc::new(AtomicUsize::new(0));
    for _ in 0..1000 {
        let completed = Arc::clone(&completed);
        let _ = executor.execute(Box::new(move || {
            completed.fetch_add(1, Ordering::Relaxed);
        }));
    }

    let drained = executor.shutdown_now();
    assert!(executor.await_termination(Duration::from_secs(30)));
    executor.join_workers();

    assert_eq!(drained.len() + completed.load(Ordering::Relaxed), 1000);
}

#[test]
fn single_queue_shutdown_is_idempotent_across_threads() {
    let executor = SingleQueueExecutor::new(SingleQueueConfig {
        pool_size: 2,
        ..Default::default()
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let executor = Arc::clone(&executor);
            std::thread::spawn(move || executor.shutdown())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(executor.is_shutdown());
    assert!(executor.await_termination(Duration::from_secs(10)));
    executor.join_workers();
}

#[test]
fn multilane_submissions_from_the_same_thread_share_a_lane() {
    let executor = MultilaneExecutor::new(MultilaneConfig {
        pool_size: 4,
        ..Default::default()
    });
    assert!(executor.lane_count() <= 4);
    assert!(executor.lane_count().is_power_of_two());

    executor.shutdown();
    assert!(executor.await_termination(Duration::from_secs(10)));
    executor.join_workers();
}
