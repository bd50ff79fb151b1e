//! `laneflow`: a lock-free actor-style concurrency substrate.
//!
//! This crate is a thin facade over three focused crates, re-exported so a
//! consumer can depend on `laneflow` alone:
//!
//! - [`laneflow_core`] — the lock-free mailbox primitives: the unbounded
//!   MPSC [`Mailbox`] and the bounded, multi-consumer [`BoundedMailbox`]
//!   (the NBBQ).
//! - [`laneflow_actor`] — [`Actor`], the single-consumer-semantics actor
//!   built on a `Mailbox`, and the [`Strategy`] abstraction that decides
//!   where an actor's batches actually run.
//! - [`laneflow_executor`] — [`SingleQueueExecutor`] and
//!   [`MultilaneExecutor`], two fixed thread-pool `Strategy` implementations
//!   with park/notify backoff and cooperative shutdown.
//!
//! A typical setup binds an actor to one of the executors:
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use laneflow::{Actor, ActorConfig, SingleQueueConfig, SingleQueueExecutor};
//!
//! let executor = SingleQueueExecutor::new(SingleQueueConfig {
//!     pool_size: 2,
//!     ..Default::default()
//! });
//!
//! let total = Arc::new(AtomicUsize::new(0));
//! let counted = Arc::clone(&total);
//! let actor = Actor::new(
//!     move |n: u64| {
//!         counted.fetch_add(n as usize, Ordering::Relaxed);
//!     },
//!     |_err| {},
//!     ActorConfig::default(),
//!     executor.clone(),
//! );
//!
//! for i in 0..100 {
//!     actor.send(i);
//! }
//!
//! executor.shutdown();
//! executor.await_termination(std::time::Duration::from_secs(5));
//! executor.join_workers();
//! assert_eq!(total.load(Ordering::Relaxed), (0..100).sum::<u64>() as usize);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub use laneflow_actor::{Actor, ActorConfig, Inline, Strategy, Task, Trampoline};
pub use laneflow_core::{
    BoundExceeded, BoundedMailbox, DeadLetterSink, Mailbox, NullDeadLetterSink,
};
pub use laneflow_executor::{
    ExecutorError, MultilaneConfig, MultilaneExecutor, SingleQueueConfig, SingleQueueExecutor,
    SpinTuner, Synchronizer,
};
