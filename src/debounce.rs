use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debounce timer.
///
/// Every [`schedule`](Debouncer::schedule) bumps a generation counter, aborts
/// the previously armed timer and arms a new one. When the window elapses
/// without another `schedule` or `cancel`, the action runs with the
/// generation it was armed for. Actions that need to take a lock before
/// committing should re-check [`is_current`](Debouncer::is_current) under
/// that lock.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Arm the timer. Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, action: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let window = self.window;

        self.pending = Some(tokio::spawn(async move {
            if !window.is_zero() {
                tokio::time::sleep(window).await;
            }
            if current.load(Ordering::SeqCst) == generation {
                action(generation).await;
            }
        }));
        generation
    }

    /// Disarm any pending timer. Its action will not run.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// True while a timer is armed and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
