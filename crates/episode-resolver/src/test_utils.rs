//! In-memory [`PageFetcher`] for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use rustc_hash::FxHashMap;

use crate::error::FetchError;
use crate::http::{PageFetcher, RequestHeaders};

/// Serves canned pages by url. Unknown urls fail with a 404.
#[derive(Default)]
pub struct MockFetcher {
    pages: FxHashMap<String, String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, RequestHeaders)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Headers sent with the last request for `url`.
    pub fn headers_for(&self, url: &str) -> Option<RequestHeaders> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, headers)| headers.clone())
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_html(&self, url: &str, headers: &RequestHeaders) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            })
    }
}
