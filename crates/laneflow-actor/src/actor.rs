//! The single-consumer actor (C4): owns a mailbox and a handler, and
//! enforces at-most-one-concurrent-processing without locks.

use std::any::Any;
use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use laneflow_core::Mailbox;

use crate::strategy::{Strategy, Task};

const IDLE: u8 = 1;
const RUNNING: u8 = 0;

/// Tunables recognised by [`Actor`] (`spec.md` §6).
#[derive(Debug, Clone, Copy)]
pub struct ActorConfig {
    /// Maximum messages drained per scheduled run before yielding back to
    /// the strategy for fairness. Default 1024.
    pub batch_size: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { batch_size: 1024 }
    }
}

/// Owns a mailbox, a handler `h: T -> ()`, an error handler, and a
/// [`Strategy`] that runs its batches.
///
/// Invariant: at any instant at most one thread executes `h` for this
/// actor. This is enforced by the `suspended` flag below, not by locking
/// the handler — `handler`/`on_error` are stored behind `UnsafeCell` and
/// accessed only while holding the conceptual "running" permit that the
/// `suspended` CAS grants, mirroring the lock-free discipline the rest of
/// this workspace uses for its mailboxes.
pub struct Actor<T, H, EH> {
    mailbox: Mailbox<T>,
    suspended: AtomicU8,
    handler: UnsafeCell<H>,
    on_error: UnsafeCell<EH>,
    batch_size: usize,
    strategy: Arc<dyn Strategy>,
}

unsafe impl<T: Send, H: Send, EH: Send> Send for Actor<T, H, EH> {}
unsafe impl<T: Send, H: Send, EH: Send> Sync for Actor<T, H, EH> {}

impl<T, H, EH> Actor<T, H, EH>
where
    T: Send + 'static,
    H: FnMut(T) + Send + 'static,
    EH: FnMut(Box<dyn Any + Send>) + Send + 'static,
{
    /// A new, idle actor bound to `strategy` with the given `handler` and
    /// `on_error` callback.
    pub fn new(handler: H, on_error: EH, config: ActorConfig, strategy: Arc<dyn Strategy>) -> Arc<Self> {
        Arc::new(Self {
            mailbox: Mailbox::new(),
            suspended: AtomicU8::new(IDLE),
            handler: UnsafeCell::new(handler),
            on_error: UnsafeCell::new(on_error),
            batch_size: config.batch_size.max(1),
            strategy,
        })
    }

    /// Enqueue `msg`. Total: never fails except on allocation failure. If
    /// the actor was idle, this schedules a run via its [`Strategy`];
    /// otherwise an in-flight or already-scheduled run will observe `msg`.
    pub fn send(self: &Arc<Self>, msg: T) {
        self.mailbox.enqueue(msg);
        if self
            .suspended
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.schedule();
        }
    }

    /// Synonym for [`Self::send`] (`spec.md` §6: "`actor.apply(x)` is a
    /// synonym").
    pub fn apply(self: &Arc<Self>, msg: T) {
        self.send(msg);
    }

    fn schedule(self: &Arc<Self>) {
        let this = Arc::clone(self);
        if self.strategy.run(Box::new(move || this.run_batch())).is_err() {
            // The strategy refused to run this batch at all (e.g. an
            // executor-backed strategy whose pool has already shut down).
            // Restore Idle so a fresh `send` can reschedule later, per
            // `spec.md` §7b's `DispatchFailure` contract.
            self.suspended.store(IDLE, Ordering::Release);
            log::error!("laneflow actor: dispatch failed, actor returned to idle");
        }
    }

    fn run_batch(self: Arc<Self>) {
        let mut processed = 0usize;
        loop {
            match self.mailbox.poll() {
                Some(msg) => {
                    self.dispatch(msg);
                    processed += 1;
                    if processed >= self.batch_size {
                        // Yield back to the strategy for fairness; more
                        // messages may remain for the next scheduled run.
                        self.schedule();
                        return;
                    }
                }
                None => {
                    // No successor visible (possibly the transient gap
                    // described in laneflow_core::mpsc). Mark idle, then
                    // double-check: this closes the race where a producer
                    // enqueued after our empty observation but before we
                    // marked ourselves idle.
                    self.suspended.store(IDLE, Ordering::Release);
                    let raced_send = !self.mailbox.is_empty()
                        && self
                            .suspended
                            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok();
                    if raced_send {
                        continue;
                    }
                    return;
                }
            }
        }
    }

    fn dispatch(&self, msg: T) {
        let handler = unsafe { &mut *self.handler.get() };
        let result = panic::catch_unwind(AssertUnwindSafe(|| handler(msg)));
        if let Err(payload) = result {
            self.handle_error(payload);
        }
    }

    fn handle_error(&self, payload: Box<dyn Any + Send>) {
        let on_error = unsafe { &mut *self.on_error.get() };
        let result = panic::catch_unwind(AssertUnwindSafe(|| on_error(payload)));
        if let Err(payload) = result {
            // `on_error` itself panicked: restore Idle so a future send can
            // reschedule this actor, then propagate — the caller of
            // `Strategy::run` (not `send`) observes this as a dispatch
            // failure.
            self.suspended.store(IDLE, Ordering::Release);
            log::error!("laneflow actor: on_error handler panicked, actor returned to idle");
            panic::resume_unwind(payload);
        }
    }

    /// Approximate queue depth, for diagnostics only.
    pub fn mailbox_is_empty(&self) -> bool {
        self.mailbox.is_empty()
    }
}
