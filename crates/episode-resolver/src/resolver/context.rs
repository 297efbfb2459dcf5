use rustc_hash::FxHashSet;

use crate::http::RequestHeaders;

/// Per-call state of one top-level resolution.
///
/// Owned by a single call and never shared between concurrent resolutions.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    headers: RequestHeaders,
    visited: FxHashSet<String>,
    max_depth: usize,
}

impl ResolutionContext {
    pub fn new(headers: RequestHeaders, max_depth: usize) -> Self {
        Self {
            headers,
            visited: FxHashSet::default(),
            max_depth,
        }
    }

    /// Headers forwarded with the first request.
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Records `url`, returning `false` if it was already visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
