//! A counting-semaphore parking primitive for [`crate::multilane`]'s idle
//! workers, resolving `spec.md` §9's open question about an AQS-style
//! synchronizer: rather than transcribe `AbstractQueuedSynchronizer`, this
//! models its `acquireShared`/`releaseShared` contract on top of a
//! `parking_lot` mutex and condvar.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A counting semaphore: each submitted task releases one permit, and an
/// idle worker acquires a permit before trying its lanes again.
pub struct Synchronizer {
    permits: Mutex<usize>,
    condvar: Condvar,
}

impl Synchronizer {
    /// A synchronizer starting with zero permits available.
    pub fn new() -> Self {
        Self {
            permits: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    /// Make `n` additional permits available, waking any workers parked in
    /// [`Self::acquire_shared_timeout`].
    pub fn release_shared(&self, n: usize) {
        if n == 0 {
            return;
        }
        let mut permits = self.permits.lock();
        *permits += n;
        if n == 1 {
            self.condvar.notify_one();
        } else {
            self.condvar.notify_all();
        }
    }

    /// Take one permit if one is immediately available, without blocking.
    pub fn try_acquire_shared(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits > 0 {
            *permits -= 1;
            true
        } else {
            false
        }
    }

    /// Block up to `timeout` for a permit to become available.
    pub fn acquire_shared_timeout(&self, timeout: Duration) -> bool {
        let mut permits = self.permits.lock();
        if *permits > 0 {
            *permits -= 1;
            return true;
        }
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let result = self.condvar.wait_for(&mut permits, deadline - now);
            if *permits > 0 {
                *permits -= 1;
                return true;
            }
            if result.timed_out() {
                return false;
            }
        }
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_acquire_fails_with_no_permits() {
        let sync = Synchronizer::new();
        assert!(!sync.try_acquire_shared());
    }

    #[test]
    fn release_then_acquire_round_trips() {
        let sync = Synchronizer::new();
        sync.release_shared(2);
        assert!(sync.try_acquire_shared());
        assert!(sync.try_acquire_shared());
        assert!(!sync.try_acquire_shared());
    }

    #[test]
    fn acquire_timeout_returns_false_when_starved() {
        let sync = Synchronizer::new();
        assert!(!sync.acquire_shared_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn concurrent_release_wakes_waiting_acquirer() {
        use std::sync::Arc;
        use std::thread;

        let sync = Arc::new(Synchronizer::new());
        let sync2 = sync.clone();
        let handle = thread::spawn(move || sync2.acquire_shared_timeout(Duration::from_secs(5)));

        thread::sleep(Duration::from_millis(20));
        sync.release_shared(1);
        assert!(handle.join().unwrap());
    }
}
