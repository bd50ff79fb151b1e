//! Errors surfaced at the executor boundary.

use thiserror::Error;

/// Errors an executor can report directly (as opposed to panics from tasks,
/// which go to the configured `on_error` callback — `spec.md` §7b).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorError {
    /// `execute` was called after `shutdown`/`shutdown_now` (`spec.md` §7c).
    #[error("submission rejected: executor is shut down")]
    Rejected,
}
