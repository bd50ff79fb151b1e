//! Lock-free mailbox primitives for the laneflow actor runtime.
//!
//! This crate provides the three leaf components of the runtime's
//! concurrency substrate: the single-link [`Node`], the unbounded
//! non-intrusive MPSC [`Mailbox`], and the bounded [`BoundedMailbox`]
//! (the "NBBQ" — non-blocking bounded queue). Everything here is
//! dependency-free so it can be vendored into `no_std` targets; the
//! thread-pool machinery that drains these mailboxes lives in
//! `laneflow-executor`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

mod node;
mod padding;

pub mod backoff;
pub mod dead_letter;
pub mod error;
pub mod mpsc;
pub mod nbbq;

pub use backoff::Backoff;
pub use dead_letter::{DeadLetterSink, NullDeadLetterSink};
pub use error::BoundExceeded;
pub use mpsc::Mailbox;
pub use nbbq::BoundedMailbox;
