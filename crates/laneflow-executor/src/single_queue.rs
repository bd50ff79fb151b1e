//! C6: a fixed thread pool draining one shared task queue.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use laneflow_actor::{Strategy, Task};
use laneflow_core::BoundedMailbox;
use parking_lot::{Condvar, Mutex};

use crate::backoff::SpinTuner;
use crate::error::ExecutorError;
use crate::panic_util;
use crate::shutdown::{self, Lifecycle, RUNNING};
use crate::thread_name::{default_pool_name, worker_thread_name};

/// Configuration for a [`SingleQueueExecutor`].
pub struct SingleQueueConfig {
    /// Number of worker threads. Defaults to the available parallelism.
    pub pool_size: usize,
    /// Rounds of `park_timeout` a worker tries before falling back to the
    /// monitor wait.
    pub park_threshold: usize,
    /// Name prefix for worker threads; a process-unique name is generated
    /// when left `None`.
    pub pool_name: Option<String>,
}

impl Default for SingleQueueConfig {
    fn default() -> Self {
        Self {
            pool_size: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            park_threshold: 200,
            pool_name: None,
        }
    }
}

/// A fixed pool of worker threads draining a single shared task queue
/// (`laneflow_core::BoundedMailbox<Task>` with an effectively unlimited
/// bound, since the NBBQ is the only queue in this crate that supports
/// concurrent multi-consumer dequeue — `spec.md` §4.4).
pub struct SingleQueueExecutor {
    queue: Arc<BoundedMailbox<Task>>,
    lifecycle: Arc<Lifecycle>,
    spin_tuner: Arc<SpinTuner>,
    park_threshold: usize,
    monitor: Arc<Mutex<()>>,
    not_empty: Arc<Condvar>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    on_error: Arc<dyn Fn(Box<dyn std::any::Any + Send>) + Send + Sync>,
}

fn default_on_error(payload: Box<dyn std::any::Any + Send>) {
    log::error!("task panicked: {}", panic_util::describe(payload.as_ref()));
}

impl SingleQueueExecutor {
    /// Build and start a pool per `config`, routing task panics to `log::error!`.
    pub fn new(config: SingleQueueConfig) -> Arc<Self> {
        Self::with_error_handler(config, default_on_error)
    }

    /// Build and start a pool per `config`, routing task panics to `on_error`.
    pub fn with_error_handler(
        config: SingleQueueConfig,
        on_error: impl Fn(Box<dyn std::any::Any + Send>) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let pool_name = config.pool_name.unwrap_or_else(default_pool_name);
        let pool_size = config.pool_size.max(1);

        let executor = Arc::new(Self {
            queue: Arc::new(BoundedMailbox::new(usize::MAX)),
            lifecycle: Arc::new(Lifecycle::new(pool_size)),
            spin_tuner: Arc::new(SpinTuner::default()),
            park_threshold: config.park_threshold,
            monitor: Arc::new(Mutex::new(())),
            not_empty: Arc::new(Condvar::new()),
            workers: Mutex::new(Vec::with_capacity(pool_size)),
            on_error: Arc::new(on_error),
        });

        log::info!("starting {pool_name} with {pool_size} workers");

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

    /// Submit `task` for execution. Rejected once the pool has begun
    /// shutting down (`spec.md` §7c).
    pub fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        Strategy::run(self, task).map_err(|_| ExecutorError::Rejected)
    }

    /// `RUNNING -> SHUTTING_DOWN`: stop accepting submissions, let every
    /// already-queued task run to completion.
    pub fn shutdown(&self) {
        self.lifecycle.shutdown();
        self.not_empty.notify_all();
    }

    /// Transition to `STOPPED` and drain whatever is still queued, returning
    /// it to the caller instead of running it.
    pub fn shutdown_now(&self) -> Vec<Task> {
        self.lifecycle.shutdown_now();
        self.not_empty.notify_all();
        let mut drained = Vec::new();
        while let Some(task) = self.queue.dequeue() {
            drained.push(task);
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

    fn worker_loop(self: Arc<Self>) {
        let pool_id = self.lifecycle.pool_id();
        shutdown::mark_worker_of(pool_id);

        loop {
            if let Some(task) = self.queue.dequeue() {
                self.run_task(task);
                continue;
            }

            // A full backoff cycle elapsed with nothing found: only exit once
            // shutdown has been requested and the queue is still empty, so a
            // task submitted mid-cycle is never silently dropped.
            self.back_off();
            if self.lifecycle.state() != RUNNING && self.queue.is_empty() {
                break;
            }
        }

        shutdown::unmark_worker_of(pool_id);
        self.lifecycle.worker_exited();
    }

    /// One full backoff cycle: spin, then park, then monitor-wait. Returns
    /// early the moment the queue is observed non-empty so the caller can
    /// get back to dequeuing without waiting out the rest of the cycle.
    fn back_off(&self) {
        let spin_budget = self.spin_tuner.optimal_spins().max(0);
        let mut spun = 0isize;
        while spun < spin_budget {
            if !self.queue.is_empty() {
                self.spin_tuner.record_spins(spun);
                return;
            }
            std::hint::spin_loop();
            spun += 1;
        }
        self.spin_tuner.record_spins(spun);

        for _ in 0..self.park_threshold {
            if !self.queue.is_empty() {
                return;
            }
            thread::park_timeout(Duration::from_nanos(1));
        }

        if !self.queue.is_empty() {
            return;
        }

        let mut guard = self.monitor.lock();
        if !self.queue.is_empty() {
            return;
        }
        let _ = self
            .not_empty
            .wait_for(&mut guard, Duration::from_millis(50));
    }

    fn run_task(&self, task: Task) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            (self.on_error)(payload);
        }
    }
}

impl Strategy for SingleQueueExecutor {
    fn run(&self, task: Task) -> Result<(), Task> {
        if self.lifecycle.is_shutdown() {
            return Err(task);
        }
        match self.queue.enqueue(task) {
            Ok(()) => {
                self.not_empty.notify_one();
                Ok(())
            }
            Err(rejected) => Err(rejected.into_payload()),
        }
    }
}
