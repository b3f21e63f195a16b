use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::ContentSource;
use crate::reconciler::Reconciler;

/// How often the full content list is re-fetched.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// Handle to the periodic content refresh. Aborts the task on drop.
pub struct Refresher {
    handle: Option<JoinHandle<()>>,
}

impl Refresher {
    /// Start refreshing. Fetches once immediately, then every `interval`.
    pub fn start<S: ContentSource>(reconciler: Reconciler<S>, interval: Duration) -> Self {
        let handle = tokio::spawn(async move {
            refresh_loop(reconciler, interval).await;
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("content refresh stopped");
        }
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_loop<S: ContentSource>(reconciler: Reconciler<S>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately.
        ticker.tick().await;
        if reconciler.is_closed() {
            return;
        }
        refresh_once(&reconciler).await;
    }
}

/// One fetch of the full list. Failures are logged and the list is emptied;
/// nothing is surfaced to the user.
pub async fn refresh_once<S: ContentSource>(reconciler: &Reconciler<S>) {
    let token = match reconciler.session().token() {
        Ok(t) => t.clone(),
        Err(e) => {
            tracing::error!("Error fetching content: {e}");
            reconciler.set_contents(Vec::new()).await;
            return;
        }
    };

    match reconciler.source().contents(&token).await {
        Ok(contents) => {
            tracing::debug!(count = contents.len(), "content refreshed");
            reconciler.set_contents(contents).await;
        }
        Err(e) => {
            tracing::error!("Error fetching content: {e}");
            reconciler.set_contents(Vec::new()).await;
        }
    }
}
