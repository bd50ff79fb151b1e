//! Hand-rolled cache-line padding.
//!
//! `laneflow-core` stays dependency-free, so it cannot reach for
//! `crossbeam_utils::CachePadded` the way `laneflow-executor` does for its
//! per-lane mailboxes. `#[repr(align(64))]` both aligns a value to a 64-byte
//! boundary and rounds its size up to a multiple of 64, which is what
//! actually guarantees two adjacent `CachePadded<_>` fields land on separate
//! cache lines — trailing padding bytes alone would not, unless the
//! containing struct is itself 64-byte aligned.

use core::ops::{Deref, DerefMut};

#[repr(align(64))]
pub(crate) struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
