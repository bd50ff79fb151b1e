//! The `Strategy` abstraction: "run this closure somewhere".

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

/// A unit of work an actor has scheduled for its next batch.
pub type Task = Box<dyn FnOnce() + Send>;

/// The sole coupling point between an [`crate::Actor`] and whatever runs its
/// batches. A strategy must eventually run every accepted submission exactly
/// once and let any panic from `task` propagate to whoever called
/// [`Strategy::run`] — never back to the actor's `send`.
///
/// `run` returns `Err(task)`, handing the task back, if the strategy could
/// not accept it at all (an executor-backed strategy whose pool has already
/// shut down, `spec.md` §7b's `DispatchFailure`). [`crate::Actor`] uses this
/// to restore itself to `Idle` so a later `send` can reschedule it; a
/// strategy that never rejects (like [`Inline`]/[`Trampoline`]) always
/// returns `Ok(())`.
pub trait Strategy: Send + Sync {
    /// Run `task`, synchronously or by handing it to another thread.
    fn run(&self, task: Task) -> Result<(), Task>;
}

/// Runs the task synchronously on the calling thread.
///
/// This is the simplest strategy and the one every actor uses by default
/// when no executor is configured: `send` and the resulting batch run on
/// the same call stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inline;

impl Strategy for Inline {
    fn run(&self, task: Task) -> Result<(), Task> {
        task();
        Ok(())
    }
}

struct TrampolineState {
    running: bool,
    queue: VecDeque<Task>,
}

thread_local! {
    static TRAMPOLINE: RefCell<TrampolineState> = RefCell::new(TrampolineState {
        running: false,
        queue: VecDeque::new(),
    });
}

/// Runs tasks on the calling thread like [`Inline`], but bounds recursion
/// depth: if running a task re-enters [`Strategy::run`] on the same thread
/// (the classic actor ping-pong pattern), the re-entrant task is queued
/// instead of recursing, and the outermost call drains the queue
/// iteratively. Two actors that keep re-scheduling each other therefore run
/// in a flat loop on one thread rather than growing the call stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct Trampoline;

impl Strategy for Trampoline {
    fn run(&self, task: Task) -> Result<(), Task> {
        let became_owner = TRAMPOLINE.with(|cell| {
            let mut state = cell.borrow_mut();
            if state.running {
                false
            } else {
                state.running = true;
                true
            }
        });

        if !became_owner {
            TRAMPOLINE.with(|cell| cell.borrow_mut().queue.push_back(task));
            return Ok(());
        }

        let mut next = Some(task);
        while let Some(t) = next.take() {
            let result = panic::catch_unwind(AssertUnwindSafe(t));
            if let Err(payload) = result {
                TRAMPOLINE.with(|cell| {
                    let mut state = cell.borrow_mut();
                    state.running = false;
                    state.queue.clear();
                });
                panic::resume_unwind(payload);
            }
            next = TRAMPOLINE.with(|cell| cell.borrow_mut().queue.pop_front());
        }
        TRAMPOLINE.with(|cell| cell.borrow_mut().running = false);
        Ok(())
    }
}
