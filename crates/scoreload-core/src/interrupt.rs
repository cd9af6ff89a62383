use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status for a run cut short by a second interrupt (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

/// Waits on `interrupt` (which resolves `true` when a signal arrives). The
/// first signal raises `stop` so virtual users finish their current iteration;
/// returns `true` if a second one arrives, after which the caller should exit
/// without waiting for in-flight requests.
pub async fn watch_interrupts<F, Fut>(stop: &AtomicBool, mut interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !interrupt().await {
        return false;
    }
    tracing::info!("interrupt received, letting in-flight iterations finish (interrupt again to exit)");
    stop.store(true, Ordering::Relaxed);
    if !interrupt().await {
        return false;
    }
    tracing::warn!("second interrupt, exiting without waiting for in-flight requests");
    true
}
