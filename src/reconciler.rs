//! Search/display reconciliation for the dashboard.
//!
//! Keystrokes update the raw term immediately and arm a debounce timer.
//! When the timer commits a term, the reconciler either queries the backend,
//! clears the search, or leaves things alone, depending on the term length.
//! Every dispatched query carries a sequence number; only the response for
//! the latest one is applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::ContentSource;
use crate::debounce::Debouncer;
use crate::error::{Result, SEARCH_FAILED};
use crate::session::Session;
use crate::types::ContentItem;

/// Quiet period before a typed term is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Committed terms shorter than this never reach the backend.
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: MIN_QUERY_LEN,
        }
    }
}

/// Search half of the view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub raw_term: String,
    pub debounced_term: String,
    pub results: Vec<ContentItem>,
    pub is_searching: bool,
    pub error: Option<String>,
}

/// Which list the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplaySelection {
    Full(Vec<ContentItem>),
    Search(Vec<ContentItem>),
}

impl DisplaySelection {
    /// A non-empty raw term selects the search results, whether or not a
    /// query has completed yet.
    pub fn select(search: &SearchState, contents: &[ContentItem]) -> Self {
        if search.raw_term.is_empty() {
            DisplaySelection::Full(contents.to_vec())
        } else {
            DisplaySelection::Search(search.results.clone())
        }
    }

    pub fn items(&self) -> &[ContentItem] {
        match self {
            DisplaySelection::Full(items) | DisplaySelection::Search(items) => items,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, DisplaySelection::Search(_))
    }
}

struct ViewState {
    search: SearchState,
    contents: Vec<ContentItem>,
    debouncer: Debouncer,
    /// Sequence number of the most recently dispatched query.
    latest_request: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl ViewState {
    /// Forget about any query currently in flight. Its response will be
    /// discarded when it lands.
    fn invalidate_in_flight(&mut self) {
        self.latest_request += 1;
        self.search.is_searching = false;
    }
}

struct Shared<S> {
    source: S,
    session: Session,
    options: ReconcilerOptions,
    state: Mutex<ViewState>,
    closed: AtomicBool,
    changes: watch::Sender<u64>,
}

/// Owns the search state of one dashboard view. Cheap to clone; clones share
/// state.
pub struct Reconciler<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ContentSource> Reconciler<S> {
    pub fn new(source: S, session: Session, options: ReconcilerOptions) -> Self {
        let (changes, _) = watch::channel(0);
        let state = ViewState {
            search: SearchState::default(),
            contents: Vec::new(),
            debouncer: Debouncer::new(options.debounce),
            latest_request: 0,
            in_flight: None,
        };
        Self {
            shared: Arc::new(Shared {
                source,
                session,
                options,
                state: Mutex::new(state),
                closed: AtomicBool::new(false),
                changes,
            }),
        }
    }

    pub fn options(&self) -> ReconcilerOptions {
        self.shared.options
    }

    pub fn source(&self) -> &S {
        &self.shared.source
    }

    pub fn session(&self) -> &Session {
        &self.shared.session
    }

    /// A keystroke: the raw term changes now, the committed term follows
    /// after the debounce window. Repeating the current term does nothing.
    pub async fn set_term(&self, raw: impl Into<String>) {
        let raw = raw.into();
        let mut st = self.shared.state.lock().await;
        if self.shared.is_closed() || st.search.raw_term == raw {
            return;
        }
        st.search.raw_term = raw.clone();

        let shared = Arc::clone(&self.shared);
        st.debouncer.schedule(move |generation| async move {
            shared.commit_debounced(generation, raw).await;
        });
        self.shared.notify();
    }

    /// Activation key: query right away with the current raw term.
    pub async fn submit(&self) {
        let mut st = self.shared.state.lock().await;
        if self.shared.is_closed() {
            return;
        }
        st.debouncer.cancel();
        let term = st.search.raw_term.clone();
        st.search.debounced_term = term.clone();

        if term.trim().is_empty() {
            self.shared.clear_results(&mut st);
        } else {
            debug!(term = %term, "search submitted");
            self.shared.dispatch(&mut st, term);
        }
        self.shared.notify();
    }

    /// Back to the full list: raw term, results and error reset together.
    pub async fn clear_search(&self) {
        let mut st = self.shared.state.lock().await;
        if self.shared.is_closed() {
            return;
        }
        st.debouncer.cancel();
        st.search.raw_term.clear();
        st.search.debounced_term.clear();
        self.shared.clear_results(&mut st);
        self.shared.notify();
    }

    /// Replace the full content list.
    pub async fn set_contents(&self, contents: Vec<ContentItem>) {
        let mut st = self.shared.state.lock().await;
        if self.shared.is_closed() {
            return;
        }
        st.contents = contents;
        self.shared.notify();
    }

    pub async fn snapshot(&self) -> SearchState {
        self.shared.state.lock().await.search.clone()
    }

    pub async fn contents(&self) -> Vec<ContentItem> {
        self.shared.state.lock().await.contents.clone()
    }

    pub async fn view(&self) -> DisplaySelection {
        let st = self.shared.state.lock().await;
        DisplaySelection::select(&st.search, &st.contents)
    }

    /// Receiver that ticks on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.changes.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Cancel the debounce timer and drop whatever is in flight. Every later
    /// call is a no-op.
    pub async fn shutdown(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        let mut st = self.shared.state.lock().await;
        st.debouncer.cancel();
        st.invalidate_in_flight();
        if let Some(handle) = st.in_flight.take() {
            handle.abort();
        }
        debug!("reconciler shut down");
    }

    /// Non-async teardown for drop paths. Falls back to the closed flag
    /// alone if the state lock is busy.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Ok(mut st) = self.shared.state.try_lock() {
            st.debouncer.cancel();
            st.invalidate_in_flight();
            if let Some(handle) = st.in_flight.take() {
                handle.abort();
            }
        }
    }
}

impl<S: ContentSource> Shared<S> {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    async fn commit_debounced(self: Arc<Self>, generation: u64, term: String) {
        let mut st = self.state.lock().await;
        if self.is_closed() || !st.debouncer.is_current(generation) {
            return;
        }
        st.search.debounced_term = term.clone();

        if term.is_empty() {
            self.clear_results(&mut st);
        } else if term.chars().count() >= self.options.min_query_len {
            self.dispatch(&mut st, term);
        } else if st.search.is_searching {
            // The in-flight query is for a term the user has moved away from.
            st.invalidate_in_flight();
        }
        self.notify();
    }

    fn clear_results(&self, st: &mut ViewState) {
        st.invalidate_in_flight();
        st.search.results.clear();
        st.search.error = None;
    }

    fn dispatch(self: &Arc<Self>, st: &mut ViewState, term: String) {
        st.latest_request += 1;
        let seq = st.latest_request;
        st.search.is_searching = true;

        let token = match self.session.token() {
            Ok(token) => token.clone(),
            Err(e) => {
                apply_outcome(st, &term, Err(e));
                return;
            }
        };

        debug!(seq, term = %term, "dispatching search");
        let shared = Arc::clone(self);
        st.in_flight = Some(tokio::spawn(async move {
            let outcome = shared.source.search(&token, &term).await;
            shared.finish(seq, &term, outcome).await;
        }));
    }

    async fn finish(&self, seq: u64, term: &str, outcome: Result<Vec<ContentItem>>) {
        let mut st = self.state.lock().await;
        if self.is_closed() || st.latest_request != seq {
            debug!(seq, latest = st.latest_request, term, "discarding stale search response");
            return;
        }
        apply_outcome(&mut st, term, outcome);
        self.notify();
    }
}

fn apply_outcome(st: &mut ViewState, term: &str, outcome: Result<Vec<ContentItem>>) {
    st.search.is_searching = false;
    match outcome {
        Ok(items) => {
            debug!(term, hits = items.len(), "search completed");
            st.search.results = items;
            st.search.error = None;
        }
        Err(e) => {
            warn!(term, "search failed: {e}");
            st.search.results.clear();
            st.search.error = Some(SEARCH_FAILED.to_string());
        }
    }
}
