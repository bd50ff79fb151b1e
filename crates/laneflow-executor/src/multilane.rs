//! C7: a sharded thread pool with one lane per worker-identity bucket.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::utils::CachePadded;
use laneflow_actor::{Strategy, Task};
use laneflow_core::BoundedMailbox;
use parking_lot::Mutex;

use crate::error::ExecutorError;
use crate::panic_util;
use crate::shutdown::{self, Lifecycle, RUNNING};
use crate::synchronizer::Synchronizer;
use crate::thread_name::{default_pool_name, worker_thread_name};

/// Configuration for a [`MultilaneExecutor`].
pub struct MultilaneConfig {
    /// Number of worker threads. Lane count is derived from this (see
    /// [`floor_pow2`]), not used directly as the lane count.
    pub pool_size: usize,
    /// Name prefix for worker threads; a process-unique name is generated
    /// when left `None`.
    pub pool_name: Option<String>,
}

impl Default for MultilaneConfig {
    fn default() -> Self {
        Self {
            pool_size: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            pool_name: None,
        }
    }
}

/// Largest power of two less than or equal to `n` (for `n >= 1`). This is a
/// floor, not `usize::next_power_of_two`'s ceiling: an 6-thread pool gets 4
/// lanes, not 8, so every lane has at least one dedicated worker on average
/// without over-sharding a small pool.
fn floor_pow2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    1usize << (usize::BITS - 1 - n.leading_zeros())
}

thread_local! {
    static THREAD_TAG: Cell<Option<usize>> = const { Cell::new(None) };
}
static NEXT_TAG: AtomicUsize = AtomicUsize::new(0);

/// A small monotonic per-thread identity, used instead of `ThreadId` (whose
/// exposure as a stable integer is not guaranteed across toolchains) to hash
/// a calling thread onto a lane.
fn thread_tag() -> usize {
    THREAD_TAG.with(|cell| {
        if let Some(tag) = cell.get() {
            tag
        } else {
            let tag = NEXT_TAG.fetch_add(1, Ordering::Relaxed);
            cell.set(Some(tag));
            tag
        }
    })
}

/// A fixed pool of worker threads, each primarily draining its own lane of a
/// sharded task queue. Producers and workers alike hash onto a lane by
/// thread identity, so same-thread submissions tend to stay on one lane
/// (cache-friendly) while a worker with an empty home lane scans the others
/// before parking.
pub struct MultilaneExecutor {
    lanes: Vec<CachePadded<BoundedMailbox<Task>>>,
    mask: usize,
    lifecycle: Arc<Lifecycle>,
    sync: Arc<Synchronizer>,
    optimal_spin: usize,
    workers: Mutex<Vec<JoinHandle<()>>>,
    on_error: Arc<dyn Fn(Box<dyn std::any::Any + Send>) + Send + Sync>,
}

fn default_on_error(payload: Box<dyn std::any::Any + Send>) {
    log::error!("task panicked: {}", panic_util::describe(payload.as_ref()));
}

impl MultilaneExecutor {
    /// Build and start a pool per `config`, routing task panics to `log::error!`.
    pub fn new(config: MultilaneConfig) -> Arc<Self> {
        Self::with_error_handler(config, default_on_error)
    }

    /// Build and start a pool per `config`, routing task panics to `on_error`.
    pub fn with_error_handler(
        config: MultilaneConfig,
        on_error: impl Fn(Box<dyn std::any::Any + Send>) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let pool_name = config.pool_name.unwrap_or_else(default_pool_name);
        let pool_size = config.pool_size.max(1);
        let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let lane_count = floor_pow2(pool_size.min(cpus));
        let optimal_spin = (256 / cpus).max(1);

        let lanes = (0..lane_count)
            .map(|_| CachePadded::new(BoundedMailbox::new(usize::MAX)))
            .collect();

        let executor = Arc::new(Self {
            lanes,
            mask: lane_count - 1,
            lifecycle: Arc::new(Lifecycle::new(pool_size)),
            sync: Arc::new(Synchronizer::new()),
            optimal_spin,
            workers: Mutex::new(Vec::with_capacity(pool_size)),
            on_error: Arc::new(on_error),
        });

        log::info!(
            "starting {pool_name} with {pool_size} workers across {lane_count} lanes"
        );

        let mut workers = Vec::with_capacity(pool_size);
        for index in 0..pool_size {
            let executor = Arc::clone(&executor);
            let name = worker_thread_name(&pool_name, index);
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || executor.worker_loop())
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }
        *executor.workers.lock() = workers;

        executor
    }

    /// Number of lanes tasks are sharded across.
    pub fn lane_count(&self) -> usize {
        self.mask + 1
    }

    /// Submit `task`, hashed onto a lane by the submitting thread's identity.
    /// Rejected once the pool has begun shutting down.
    pub fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        Strategy::run(self, task).map_err(|_| ExecutorError::Rejected)
    }

    /// `RUNNING -> SHUTTING_DOWN`: stop accepting submissions, let every
    /// already-queued task run to completion.
    pub fn shutdown(&self) {
        self.lifecycle.shutdown();
        self.sync.release_shared(self.lane_count());
    }

    /// Transition to `STOPPED` and drain whatever is still queued across all
    /// lanes, returning it to the caller instead of running it.
    pub fn shutdown_now(&self) -> Vec<Task> {
        self.lifecycle.shutdown_now();
        self.sync.release_shared(self.lane_count());
        let mut drained = Vec::new();
        for lane in &self.lanes {
            while let Some(task) = lane.dequeue() {
                drained.push(task);
            }
        }
        drained
    }

    /// True once `shutdown`/`shutdown_now` has been called.
    pub fn is_shutdown(&self) -> bool {
        self.lifecycle.is_shutdown()
    }

    /// True once every worker thread has exited.
    pub fn is_terminated(&self) -> bool {
        self.lifecycle.is_terminated()
    }

    /// Block until every worker has exited or `timeout` elapses.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.lifecycle.await_termination(timeout)
    }

    /// Join every worker thread. Safe to call after `await_termination`
    /// returns `true`; blocks indefinitely otherwise.
    pub fn join_workers(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }

    fn poll_lanes(&self, home: usize) -> Option<Task> {
        if let Some(task) = self.lanes[home].dequeue() {
            return Some(task);
        }
        for i in 1..self.lane_count() {
            let lane = home ^ i;
            if let Some(task) = self.lanes[lane].dequeue() {
                return Some(task);
            }
        }
        None
    }

    fn worker_loop(self: Arc<Self>) {
        let pool_id = self.lifecycle.pool_id();
        shutdown::mark_worker_of(pool_id);
        let home = thread_tag() & self.mask;

        loop {
            if let Some(task) = self.poll_lanes(home) {
                self.run_task(task);
                for _ in 0..self.optimal_spin {
                    if let Some(task) = self.poll_lanes(home) {
                        self.run_task(task);
                    } else {
                        break;
                    }
                }
                continue;
            }

            if self.lifecycle.state() != RUNNING {
                let mut all_empty = true;
                for lane in &self.lanes {
                    if !lane.is_empty() {
                        all_empty = false;
                        break;
                    }
                }
                if all_empty {
                    break;
                }
            }

            if !self.sync.try_acquire_shared() {
                self.sync.acquire_shared_timeout(Duration::from_millis(20));
            }
        }

        shutdown::unmark_worker_of(pool_id);
        self.lifecycle.worker_exited();
    }

    fn run_task(&self, task: Task) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            (self.on_error)(payload);
        }
    }
}

impl Strategy for MultilaneExecutor {
    fn run(&self, task: Task) -> Result<(), Task> {
        if self.lifecycle.is_shutdown() {
            return Err(task);
        }
        let lane = thread_tag() & self.mask;
        match self.lanes[lane].enqueue(task) {
            Ok(()) => {
                self.sync.release_shared(1);
                Ok(())
            }
            Err(rejected) => Err(rejected.into_payload()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn floor_pow2_rounds_down_not_up() {
        assert_eq!(floor_pow2(1), 1);
        assert_eq!(floor_pow2(2), 2);
        assert_eq!(floor_pow2(6), 4);
        assert_eq!(floor_pow2(8), 8);
        assert_eq!(floor_pow2(9), 8);
    }

    #[test]
    fn runs_every_submitted_task() {
        let executor = MultilaneExecutor::new(MultilaneConfig {
            pool_size: 4,
            ..Default::default()
        });
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..1000 {
            let counter = Arc::clone(&counter);
            executor
                .execute(Box::new(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap();
        }

        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(5)));
        executor.join_workers();
        assert_eq!(counter.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn same_thread_submissions_land_in_the_same_lane() {
        let executor = MultilaneExecutor::new(MultilaneConfig {
            pool_size: 4,
            ..Default::default()
        });
        let lane_a = thread_tag() & executor.mask;
        let lane_b = thread_tag() & executor.mask;
        assert_eq!(lane_a, lane_b);

        executor.shutdown();
        executor.await_termination(Duration::from_secs(5));
        executor.join_workers();
    }

    #[test]
    fn rejects_submissions_after_shutdown() {
        let executor = MultilaneExecutor::new(MultilaneConfig {
            pool_size: 2,
            ..Default::default()
        });
        executor.shutdown();
        assert!(matches!(
            executor.execute(Box::new(|| {})),
            Err(ExecutorError::Rejected)
        ));
        assert!(executor.await_termination(Duration::from_secs(5)));
        executor.join_workers();
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let executor = MultilaneExecutor::new(MultilaneConfig {
            pool_size: 1,
            ..Default::default()
        });
        executor.execute(Box::new(|| panic!("boom"))).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = Arc::clone(&counter);
        executor
            .execute(Box::new(move || {
                counter2.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();

        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(5)));
        executor.join_workers();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
