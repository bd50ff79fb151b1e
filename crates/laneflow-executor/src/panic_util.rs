//! Best-effort extraction of a human-readable message from a panic payload.

use std::any::Any;

/// Render a caught panic payload as a string for logging, falling back to a
/// generic message for payloads that aren't `&str`/`String` (e.g. custom
/// panic values from `std::panic::panic_any`).
pub fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
