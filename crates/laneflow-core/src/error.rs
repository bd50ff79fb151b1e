//! Error types for the mailbox primitives.

use core::fmt;

/// Returned by [`crate::BoundedMailbox::enqueue`] when the mailbox is at
/// capacity. Carries the rejected payload back to the caller so it can be
/// routed to a [`crate::DeadLetterSink`] or retried.
pub struct BoundExceeded<T> {
    /// The payload that could not be enqueued.
    pub payload: T,
}

impl<T> BoundExceeded<T> {
    /// Discard the rejected payload and keep only the error.
    pub fn into_payload(self) -> T {
        self.payload
    }
}

impl<T> fmt::Debug for BoundExceeded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundExceeded").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for BoundExceeded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bounded mailbox capacity exceeded")
    }
}

#[cfg(feature = "std")]
impl<T> std::error::Error for BoundExceeded<T> {}
