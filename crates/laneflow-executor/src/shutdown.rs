//! Shared lifecycle state for both executor variants (C8).

use std::cell::RefCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Pool is accepting submissions and running normally.
pub const RUNNING: u8 = 0;
/// `shutdown()` has been called: no new submissions, existing work drains.
pub const SHUTTING_DOWN: u8 = 1;
/// `shutdown_now()` has been called: no new submissions, queued-but-not-yet-started
/// work has been drained back to the caller.
pub const STOPPED: u8 = 2;

thread_local! {
    static WORKER_OF: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Record that the calling thread is a worker of the pool identified by
/// `pool_id` (its `Lifecycle`'s own address, which is stable for the life of
/// the Arc-owned executor).
pub fn mark_worker_of(pool_id: usize) {
    WORKER_OF.with(|cell| cell.borrow_mut().push(pool_id));
}

/// Undo [`mark_worker_of`] when a worker exits.
pub fn unmark_worker_of(pool_id: usize) {
    WORKER_OF.with(|cell| cell.borrow_mut().retain(|&id| id != pool_id));
}

/// True if the calling thread is currently a worker of `pool_id`.
pub fn is_worker_of(pool_id: usize) -> bool {
    WORKER_OF.with(|cell| cell.borrow().contains(&pool_id))
}

/// A countdown latch that reaches zero once every worker has exited.
///
/// `await_zero` takes a `self_exempt` flag: a worker thread awaiting its own
/// pool's termination would otherwise deadlock (it can never see its own
/// exit, since it is blocked inside this call). When `self_exempt` is set,
/// the wait is satisfied once every *other* worker has exited — this thread
/// will exit for real shortly after returning from whatever task is
/// currently calling `await_termination`.
struct Latch {
    remaining: Mutex<usize>,
    condvar: Condvar,
}

impl Latch {
    fn new(n: usize) -> Self {
        Self {
            remaining: Mutex::new(n),
            condvar: Condvar::new(),
        }
    }

    fn count(&self) -> usize {
        *self.remaining.lock()
    }

    fn count_down(&self) {
        let mut guard = self.remaining.lock();
        if *guard > 0 {
            *guard -= 1;
            if *guard == 0 {
                self.condvar.notify_all();
            }
        }
    }

    fn await_zero(&self, timeout: Duration, self_exempt: bool) -> bool {
        let target = if self_exempt { 1 } else { 0 };
        let mut guard = self.remaining.lock();
        if *guard <= target {
            return true;
        }
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return *guard <= target;
            }
            let result = self.condvar.wait_for(&mut guard, deadline - now);
            if *guard <= target {
                return true;
            }
            if result.timed_out() {
                return false;
            }
        }
    }
}

/// The monotone 3-state lifecycle plus its termination latch, shared by both
/// executor implementations.
pub struct Lifecycle {
    state: AtomicU8,
    latch: Latch,
}

impl Lifecycle {
    /// A fresh, running lifecycle whose latch counts down `worker_count` times.
    pub fn new(worker_count: usize) -> Self {
        Self {
            state: AtomicU8::new(RUNNING),
            latch: Latch::new(worker_count),
        }
    }

    /// The pool identity used for [`mark_worker_of`]/[`is_worker_of`]: this
    /// `Lifecycle`'s own stable address.
    pub fn pool_id(&self) -> usize {
        self as *const Self as usize
    }

    /// Current state: [`RUNNING`], [`SHUTTING_DOWN`], or [`STOPPED`].
    pub fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// True once `shutdown`/`shutdown_now` has been called at least once.
    pub fn is_shutdown(&self) -> bool {
        self.state() != RUNNING
    }

    /// True once every worker has exited.
    pub fn is_terminated(&self) -> bool {
        self.latch.count() == 0
    }

    /// `RUNNING -> SHUTTING_DOWN`. Idempotent: a second call is a no-op, and
    /// calling this after `shutdown_now` does not move the state backwards.
    pub fn shutdown(&self) {
        let _ = self.state.compare_exchange(
            RUNNING,
            SHUTTING_DOWN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Forward-only transition to `STOPPED` from whatever state the pool is
    /// currently in. Idempotent.
    pub fn shutdown_now(&self) {
        loop {
            let cur = self.state.load(Ordering::Acquire);
            if cur == STOPPED {
                return;
            }
            if self
                .state
                .compare_exchange_weak(cur, STOPPED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Called exactly once by each worker thread as it exits.
    pub fn worker_exited(&self) {
        self.latch.count_down();
    }

    /// Block until every worker has exited or `timeout` elapses. See
    /// [`Latch::await_zero`] for the self-deadlock avoidance this applies
    /// when the calling thread is itself a worker of this pool.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let self_exempt = is_worker_of(self.pool_id());
        self.latch.await_zero(timeout, self_exempt)
    }
}
