//! Stream resolution.
//!
//! Walks from an embed url to a direct media url. Every page is run through
//! the inline-script strategies, the video-tag fallback and finally the
//! nested-frame lookup; redirect descriptors fan out into their links. The
//! walk is driven by an explicit stack so the depth and cycle limits hold no
//! matter how adversarial the upstream chain is.

pub mod context;
pub mod page;
pub mod redirect;
pub mod strategies;
pub mod unpacker;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::extractor::utils::resolve_against;
use crate::http::{PageFetcher, RequestHeaders};
use crate::media::ResolvedStream;

pub use context::ResolutionContext;
pub use page::{PageOutcome, analyze_page};

/// One pending url on the work-list.
#[derive(Debug)]
struct Frame {
    url: String,
    depth: usize,
    headers: Arc<RequestHeaders>,
}

pub struct StreamResolver {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
    referer: String,
    max_depth: usize,
}

impl StreamResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &ResolverConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
            referer: config.referer(),
            max_depth: config.max_depth,
        }
    }

    /// Resolves `url` into a direct media url.
    ///
    /// Never fails: every dead end, including exhausted fetches, ends in
    /// [`ResolvedStream::unresolved`].
    pub async fn resolve(&self, url: &str, headers: Option<&RequestHeaders>) -> ResolvedStream {
        let mut ctx = ResolutionContext::new(headers.cloned().unwrap_or_default(), self.max_depth);
        self.resolve_with_context(url, &mut ctx).await
    }

    pub async fn resolve_with_context(
        &self,
        url: &str,
        ctx: &mut ResolutionContext,
    ) -> ResolvedStream {
        let mut stack = vec![Frame {
            url: url.to_string(),
            depth: 0,
            headers: Arc::new(ctx.headers().clone()),
        }];

        while let Some(frame) = stack.pop() {
            if frame.depth > ctx.max_depth() {
                debug!(url = %frame.url, depth = frame.depth, "Maximum resolution depth reached");
                continue;
            }
            if !ctx.mark_visited(&frame.url) {
                debug!(url = %frame.url, "Skipping already visited url");
                continue;
            }

            if let Some(payload) = redirect::descriptor_payload(&frame.url)
                && self.expand_descriptor(&frame, &payload, &mut stack)
            {
                continue;
            }

            let html = match self.fetcher.fetch_html(&frame.url, &frame.headers).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %frame.url, error = %e, "Failed to fetch player page");
                    continue;
                }
            };

            match analyze_page(&frame.url, &self.base_url, &html) {
                PageOutcome::Found { stream, strategy } => {
                    info!(
                        url = %frame.url,
                        stream_url = stream.url().unwrap_or_default(),
                        media_kind = %stream.media_kind,
                        strategy,
                        depth = frame.depth,
                        "Resolved stream"
                    );
                    return stream;
                }
                PageOutcome::Frame(next) => {
                    debug!(from = %frame.url, to = %next, "Following nested frame");
                    stack.push(Frame {
                        url: next,
                        depth: frame.depth + 1,
                        headers: Arc::clone(&frame.headers),
                    });
                }
                PageOutcome::Miss => {
                    debug!(url = %frame.url, "No stream found on page");
                }
            }
        }

        info!(url, visited = ctx.visited_count(), "Stream could not be resolved");
        ResolvedStream::unresolved()
    }

    /// Pushes the descriptor's links so the first one is popped first.
    ///
    /// Returns `false` when the payload holds no links; the url is then
    /// treated as an ordinary page.
    fn expand_descriptor(&self, frame: &Frame, payload: &str, stack: &mut Vec<Frame>) -> bool {
        let links = match redirect::decode_links(payload) {
            Ok(links) if !links.is_empty() => links,
            Ok(_) => {
                debug!(url = %frame.url, "Redirect descriptor without links");
                return false;
            }
            Err(e) => {
                warn!(url = %frame.url, error = %e, "Malformed redirect descriptor");
                return false;
            }
        };
        debug!(url = %frame.url, links = links.len(), "Expanding redirect descriptor");

        let mut headers = (*frame.headers).clone();
        headers.insert("Referer".to_string(), self.referer.clone());
        let headers = Arc::new(headers);

        stack.extend(links.iter().rev().map(|link| Frame {
            url: resolve_against(&frame.url, &self.base_url, link),
            depth: frame.depth + 1,
            headers: Arc::clone(&headers),
        }));
        true
    }
}
