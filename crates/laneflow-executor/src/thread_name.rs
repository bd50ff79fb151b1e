//! Worker thread naming, mirroring the `FixedThreadPool-N-worker-I` style.

use std::sync::atomic::{AtomicUsize, Ordering};

static POOL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A default, process-unique pool name for executors created without an
/// explicit `pool_name`.
pub fn default_pool_name() -> String {
    let n = POOL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("FixedThreadPool-{n}")
}

/// The name given to worker `index` of a pool named `pool_name`.
pub fn worker_thread_name(pool_name: &str, index: usize) -> String {
    format!("{pool_name}-worker-{index}")
}
