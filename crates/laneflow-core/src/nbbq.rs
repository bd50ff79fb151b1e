//! Bounded MPSC-enqueue / MC-dequeue mailbox (the "NBBQ").
//!
//! Same linked-node shape as [`crate::mpsc::Mailbox`], but each node carries
//! a monotonically increasing `count` assigned at enqueue time, and enqueue
//! uses a CAS on `head` (rather than a swap) so a losing producer can
//! recompute its candidate count against the new head before retrying.

use alloc::boxed::Box;
use core::mem::MaybeUninit;
use core::ptr;
#[cfg(not(loom))]
use core::sync::atomic::{AtomicPtr, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicPtr, Ordering};

use crate::backoff::Backoff;
use crate::error::BoundExceeded;
use crate::padding::CachePadded;

struct NbbqNode<T> {
    data: MaybeUninit<T>,
    next: AtomicPtr<NbbqNode<T>>,
    count: usize,
}

impl<T> NbbqNode<T> {
    fn sentinel() -> Box<Self> {
        Box::new(Self {
            data: MaybeUninit::uninit(),
            next: AtomicPtr::new(ptr::null_mut()),
            count: 0,
        })
    }
}

/// A bounded mailbox with a soft capacity ceiling.
///
/// The bound is soft, not strict, under contention: the read of `tail.count`
/// used to compute remaining capacity is not linearised with the `head` CAS,
/// so a burst of concurrent producers racing a concurrently-draining
/// consumer may admit a few more than `bound` messages. The ceiling is exact
/// whenever the consumer is idle during the burst (see `spec.md` §4.2).
pub struct BoundedMailbox<T> {
    head: CachePadded<AtomicPtr<NbbqNode<T>>>,
    tail: CachePadded<AtomicPtr<NbbqNode<T>>>,
    bound: usize,
}

unsafe impl<T: Send> Send for BoundedMailbox<T> {}
unsafe impl<T: Send> Sync for BoundedMailbox<T> {}

impl<T> BoundedMailbox<T> {
    /// A new bounded mailbox. `bound` is the soft capacity ceiling described
    /// above; it need not be a power of two (this is a linked queue, not a
    /// ring buffer).
    pub fn new(bound: usize) -> Self {
        let sentinel = Box::into_raw(NbbqNode::sentinel());
        Self {
            head: CachePadded::new(AtomicPtr::new(sentinel)),
            tail: CachePadded::new(AtomicPtr::new(sentinel)),
            bound,
        }
    }

    /// The configured soft capacity.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Attempt to enqueue `payload`. Fails with [`BoundExceeded`], returning
    /// the payload, once the observed live length reaches `bound`.
    pub fn enqueue(&self, payload: T) -> Result<(), BoundExceeded<T>> {
        let n = Box::into_raw(Box::new(NbbqNode {
            data: MaybeUninit::new(payload),
            next: AtomicPtr::new(ptr::null_mut()),
            count: 0,
        }));
        let mut backoff = Backoff::new();
        loop {
            let h = self.head.load(Ordering::Acquire);
            // Safety: `h` is always a live node owned by this mailbox.
            let hc = unsafe { (*h).count };
            let tc = unsafe { (*self.tail.load(Ordering::Acquire)).count };
            if hc.wrapping_sub(tc) >= self.bound {
                // Safety: `n` was never published; we still own it outright.
                let payload = unsafe { Box::from_raw(n).data.assume_init() };
                return Err(BoundExceeded { payload });
            }
            // Safety: `n` is not yet visible to any other thread.
            unsafe {
                (*n).count = hc + 1;
            }
            match self
                .head
                .compare_exchange_weak(h, n, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    // Safety: `h` was the head; publishing its successor is
                    // this enqueue's sole responsibility now that the CAS
                    // has won.
                    unsafe {
                        (*h).next.store(n, Ordering::Release);
                    }
                    return Ok(());
                }
                Err(_) => {
                    backoff.spin();
                    continue;
                }
            }
        }
    }

    /// Dequeue the next payload. CAS-based so multiple consumers may call
    /// this concurrently (unlike [`crate::mpsc::Mailbox::poll`], which is
    /// single-consumer only).
    pub fn dequeue(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        loop {
            let t = self.tail.load(Ordering::Acquire);
            // Safety: `t` is always a live node owned by this mailbox.
            let n = unsafe { (*t).next.load(Ordering::Acquire) };
            if n.is_null() {
                return None;
            }
            match self
                .tail
                .compare_exchange_weak(t, n, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    // Safety: this thread won the CAS, so it is the unique
                    // owner of `n`'s payload and of freeing `t`.
                    let payload = unsafe { (*n).data.as_ptr().read() };
                    unsafe {
                        drop(Box::from_raw(t));
                    }
                    return Some(payload);
                }
                Err(_) => {
                    backoff.spin();
                    continue;
                }
            }
        }
    }

    /// Approximate live length (racy under concurrent access).
    pub fn len(&self) -> usize {
        let h = self.head.load(Ordering::Acquire);
        let t = self.tail.load(Ordering::Acquire);
        unsafe { (*h).count.wrapping_sub((*t).count) }
    }

    /// True if, as observed right now, the mailbox has nothing queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for BoundedMailbox<T> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}
        let t = *self.tail.get_mut();
        unsafe {
            drop(Box::from_raw(t));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn strict_bound_with_idle_consumer() {
        let mailbox = BoundedMailbox::new(10);
        for i in 0..10 {
            assert!(mailbox.enqueue(i).is_ok());
        }
        assert!(mailbox.enqueue(10).is_err());
        assert_eq!(mailbox.len(), 10);
    }

    #[test]
    fn rejected_enqueue_returns_payload() {
        let mailbox = BoundedMailbox::new(1);
        assert!(mailbox.enqueue("a").is_ok());
        let err = mailbox.enqueue("b").unwrap_err();
        assert_eq!(err.into_payload(), "b");
    }

    #[test]
    fn fifo_roundtrip() {
        let mailbox = BoundedMailbox::new(100);
        for i in 0..50 {
            mailbox.enqueue(i).unwrap();
        }
        for i in 0..50 {
            assert_eq!(mailbox.dequeue(), Some(i));
        }
        assert_eq!(mailbox.dequeue(), None);
    }

    #[test]
    fn concurrent_enqueue_admits_between_bound_and_double_bound() {
        // Mirrors the S5 scenario: 10 producers each attempt 2 enqueues
        // against a capacity-10 mailbox with the consumer paused.
        let mailbox = Arc::new(BoundedMailbox::new(10));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let mailbox = Arc::clone(&mailbox);
                thread::spawn(move || {
                    let mut accepted = 0;
                    for i in 0..2 {
                        if mailbox.enqueue(i).is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!((10..=20).contains(&accepted), "accepted = {accepted}");

        let mut delivered = 0;
        while mailbox.dequeue().is_some() {
            delivered += 1;
        }
        assert_eq!(delivered, accepted);
    }
}
