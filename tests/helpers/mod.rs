//! In-process stand-in for the Brainly backend.

#![allow(dead_code)]

pub mod backend;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use brainly::error::{ClientError, Result};
use brainly::session::{AuthToken, Session};
use brainly::types::{ContentItem, ContentType, Tag};
use brainly::{ContentSource, ReconcilerOptions};

#[derive(Default)]
struct Inner {
    queries: Mutex<Vec<String>>,
    tokens: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    contents: Mutex<Vec<ContentItem>>,
    content_calls: AtomicUsize,
    fail_search: AtomicBool,
    fail_contents: AtomicBool,
}

/// Records every call. Search answers with one hit titled after the term.
#[derive(Clone, Default)]
pub struct FakeSource {
    inner: Arc<Inner>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queries(&self) -> Vec<String> {
        self.inner.queries.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.inner.tokens.lock().unwrap().clone()
    }

    pub fn content_calls(&self) -> usize {
        self.inner.content_calls.load(Ordering::SeqCst)
    }

    /// Delay the response for one particular term.
    pub fn delay(&self, term: &str, delay: Duration) {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(term.to_string(), delay);
    }

    pub fn set_contents(&self, items: Vec<ContentItem>) {
        *self.inner.contents.lock().unwrap() = items;
    }

    pub fn fail_search(&self, fail: bool) {
        self.inner.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn fail_contents(&self, fail: bool) {
        self.inner.fail_contents.store(fail, Ordering::SeqCst);
    }
}

fn server_error() -> ClientError {
    ClientError::Status {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        body: "boom".to_string(),
    }
}

impl ContentSource for FakeSource {
    async fn search(&self, token: &AuthToken, term: &str) -> Result<Vec<ContentItem>> {
        self.inner.queries.lock().unwrap().push(term.to_string());
        self.inner.tokens.lock().unwrap().push(token.as_str().to_string());
        let delay = self.inner.delays.lock().unwrap().get(term).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail_search.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(vec![hit(term)])
    }

    async fn contents(&self, _token: &AuthToken) -> Result<Vec<ContentItem>> {
        self.inner.content_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_contents.load(Ordering::SeqCst) {
            return Err(server_error());
        }
        Ok(self.inner.contents.lock().unwrap().clone())
    }
}

pub fn hit(term: &str) -> ContentItem {
    ContentItem {
        title: format!("hit for {term}"),
        link: format!("https://www.youtube.com/results?search_query={term}"),
        kind: ContentType::Youtube,
        tags: vec![Tag {
            id: "t1".to_string(),
            text: term.to_string(),
        }],
    }
}

pub fn item(title: &str, kind: ContentType) -> ContentItem {
    ContentItem {
        title: title.to_string(),
        link: format!("https://example.com/{title}"),
        kind,
        tags: vec![],
    }
}

pub fn signed_in() -> Session {
    Session::with_token(AuthToken::new("test-token"))
}

pub fn options() -> ReconcilerOptions {
    ReconcilerOptions::default()
}

pub async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
