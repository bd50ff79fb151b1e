//! Fixed thread-pool executors for the laneflow actor runtime.
//!
//! Two interchangeable implementations of the same contract
//! (`execute`/`shutdown`/`shutdown_now`/`is_shutdown`/`is_terminated`/
//! `await_termination`):
//!
//! - [`single_queue::SingleQueueExecutor`] (C6): one shared MPSC-style task
//!   queue drained by every worker, three-stage backoff (spin, park,
//!   monitor-wait) tuned by an exponential moving average.
//! - [`multilane::MultilaneExecutor`] (C7): a sharded, power-of-two set of
//!   lanes keyed by submitting/worker thread identity, with an AQS-style
//!   [`synchronizer::Synchronizer`] for parking idle workers.
//!
//! Both implement `laneflow_actor::Strategy`, so an [`laneflow_actor::Actor`]
//! can be bound to either without knowing which one it's running on.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod error;
pub mod multilane;
pub mod panic_util;
pub mod shutdown;
pub mod single_queue;
pub mod synchronizer;
pub mod thread_name;

pub use backoff::SpinTuner;
pub use error::ExecutorError;
pub use multilane::{MultilaneConfig, MultilaneExecutor};
pub use single_queue::{SingleQueueExecutor, SingleQueueConfig};
pub use synchronizer::Synchronizer;
