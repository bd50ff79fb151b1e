//! The abstract "record undeliverable envelope" collaborator.

/// A sink for payloads that a [`crate::BoundedMailbox`] could not accept.
///
/// This crate names the contract only; callers wire up logging, metrics, or
/// another mailbox as their own concern.
pub trait DeadLetterSink<T>: Send + Sync {
    /// Record a payload that failed to enqueue.
    fn record(&self, payload: T);
}

/// A sink that silently discards everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDeadLetterSink;

impl<T> DeadLetterSink<T> for NullDeadLetterSink {
    fn record(&self, _payload: T) {}
}
