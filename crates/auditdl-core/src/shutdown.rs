//! Cooperative cancellation of the download pipeline
//!
//! A single process-wide flag. The CLI trips it from its signal
//! handler; download workers check it before picking up each job and
//! stop dispatching once it is set. In-flight transfers finish, and
//! jobs that never started are reported as cancelled.

use std::sync::atomic::{AtomicBool, Ordering};

/// The cancellation flag itself. Exposed so tests and signal handlers
/// can manipulate it directly.
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// True once cancellation has been requested.
pub fn is_shutdown_requested() -> bool {
    shutdown_flag().load(Ordering::Relaxed)
}

/// Trip the flag. Only touches the atomic, so it is safe to call from
/// a signal handler.
pub fn request_shutdown() {
    shutdown_flag().store(true, Ordering::Relaxed);
}
