use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation token scoped to one triggering edit event.
///
/// Every run spawned from an event carries a clone of that event's token
/// and checks it immediately before any adoption step. Cancellation asks a
/// running subprocess to terminate and makes the run's result ineligible
/// for adoption; it is never reported as an error.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token cancelled. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Resolve once the token is cancelled. Used as a `tokio::select!`
    /// branch racing subprocess I/O.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}
