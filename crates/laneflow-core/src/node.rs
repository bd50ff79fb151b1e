//! Shared node layout used by both mailbox variants.

use alloc::boxed::Box;
use core::mem::MaybeUninit;
use core::ptr;
#[cfg(not(loom))]
use core::sync::atomic::AtomicPtr;
#[cfg(loom)]
use loom::sync::atomic::AtomicPtr;

/// A single-link atomic cell carrying one payload.
///
/// `next` is written exactly once after a node is linked into a queue;
/// readers observe it via an acquire load. A node whose `data` has already
/// been taken (the sentinel at the consumer end) leaves `data` as
/// `MaybeUninit::uninit()` and must never be read again.
pub(crate) struct Node<T> {
    pub(crate) data: MaybeUninit<T>,
    pub(crate) next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    /// A sentinel node with no payload; used as the initial `head == tail`.
    pub(crate) fn sentinel() -> Box<Self> {
        Box::new(Self {
            data: MaybeUninit::uninit(),
            next: AtomicPtr::new(ptr::null_mut()),
        })
    }

    /// A node carrying `payload`, not yet linked anywhere.
    pub(crate) fn with_payload(payload: T) -> Box<Self> {
        Box::new(Self {
            data: MaybeUninit::new(payload),
            next: AtomicPtr::new(ptr::null_mut()),
        })
    }
}
