//! Unbounded non-intrusive MPSC mailbox (the Vyukov queue).

use alloc::boxed::Box;
#[cfg(not(loom))]
use core::sync::atomic::{AtomicPtr, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicPtr, Ordering};

use crate::node::Node;

/// Many producers, one consumer, unbounded, lock-free.
///
/// `head` is the producer-side pointer to the most recently enqueued node.
/// `tail` is consumer-only and always points at a node whose payload has
/// already been taken (the sentinel); the live queue is the suffix
/// `tail.next, tail.next.next, …, head`.
///
/// Enqueue publishes in two steps — an atomic swap on `head` followed by a
/// store on the previous head's `next` — rather than a single CAS. That is
/// not an oversight: the swap alone serialises producers, and the consumer's
/// acquire load on `next` is what makes the following store visible. See the
/// module-level contract in `spec.md` §9 for why collapsing this into one
/// CAS would be wrong.
pub struct Mailbox<T> {
    head: AtomicPtr<Node<T>>,
    tail: AtomicPtr<Node<T>>,
}

unsafe impl<T: Send> Send for Mailbox<T> {}
unsafe impl<T: Send> Sync for Mailbox<T> {}

impl<T> Mailbox<T> {
    /// An empty mailbox, `head == tail == sentinel`.
    pub fn new() -> Self {
        let sentinel = Box::into_raw(Node::sentinel());
        Self {
            head: AtomicPtr::new(sentinel),
            tail: AtomicPtr::new(sentinel),
        }
    }

    /// Enqueue `payload`. Total: never fails except on allocation failure,
    /// which aborts like any other Rust allocation. Any number of threads
    /// may call this concurrently.
    pub fn enqueue(&self, payload: T) {
        let n = Box::into_raw(Node::with_payload(payload));
        // Serialises producers: whichever thread's swap lands last is the
        // new head, and every thread sees a distinct `prev`.
        let prev = self.head.swap(n, Ordering::AcqRel);
        // Safety: `prev` was the head and no other thread will free it until
        // this store makes it reachable from `tail` via `next`.
        unsafe {
            (*prev).next.store(n, Ordering::Release);
        }
    }

    /// Dequeue the next payload in FIFO order for this consumer, or `None`
    /// if the mailbox is empty *or* a producer's swap has landed but its
    /// `next` publication hasn't yet become visible (the transient gap
    /// described in `spec.md` §4.1). Callers that need to distinguish "truly
    /// empty" from "transient gap" should retry a bounded number of times
    /// before treating the mailbox as idle.
    ///
    /// # Safety (logical, not memory-unsafety)
    /// Must not be called concurrently with itself — this mailbox is single
    /// consumer. The actor layer enforces this via its `suspended` flag.
    pub fn poll(&self) -> Option<T> {
        let t = self.tail.load(Ordering::Relaxed);
        // Safety: `t` is always a live node owned by this mailbox.
        let n = unsafe { (*t).next.load(Ordering::Acquire) };
        if n.is_null() {
            return None;
        }
        // Safety: `n` was published by a completed enqueue, so its `data`
        // is initialised exactly once and not yet read.
        let payload = unsafe { (*n).data.as_ptr().read() };
        self.tail.store(n, Ordering::Relaxed);
        // Safety: `t` is unreachable from any other thread once `tail` has
        // moved past it; no consumer but this one ever read `t`.
        unsafe {
            drop(Box::from_raw(t));
        }
        Some(payload)
    }

    /// True if, as observed right now, there is nothing to poll. Subject to
    /// the same transient-gap caveat as [`Self::poll`].
    pub fn is_empty(&self) -> bool {
        let t = self.tail.load(Ordering::Relaxed);
        unsafe { (*t).next.load(Ordering::Acquire).is_null() }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Mailbox<T> {
    fn drop(&mut self) {
        while self.poll().is_some() {}
        let t = *self.tail.get_mut();
        unsafe {
            drop(Box::from_raw(t));
        }
    }
}
