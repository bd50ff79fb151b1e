//! The single-consumer actor and the `Strategy` abstraction that runs it.
//!
//! An [`Actor`] owns a [`laneflow_core::Mailbox`] and a handler, and
//! enforces "at most one scheduled execution at a time" without locks. A
//! [`Strategy`] is the sole coupling point between an actor and whatever
//! runs its batches — inline on the sending thread, trampolined to bound
//! recursion depth, or submitted to an executor (`laneflow-executor`).

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod strategy;

pub use actor::{Actor, ActorConfig};
pub use strategy::{Inline, Strategy, Task, Trampoline};
