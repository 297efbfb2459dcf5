//! Episode resolution service.
//!
//! [`EpisodeService`] owns the fetcher, the stream resolver and the caches.
//! It is built once at startup and shared by handle; nothing in this module
//! is global.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{Operation, TtlCache, generate_key};
use crate::config::ResolverConfig;
use crate::error::Result;
use crate::extractor::utils::build_url;
use crate::extractor::{parse_episode_page, parse_server_page};
use crate::http::{HttpFetcher, PageFetcher, RequestHeaders, install_rustls_provider};
use crate::media::{EpisodeDetails, MediaKind, ResolvedStream, SourceCandidate};
use crate::resolver::StreamResolver;

pub struct EpisodeService {
    config: ResolverConfig,
    fetcher: Arc<dyn PageFetcher>,
    resolver: StreamResolver,
    episodes: TtlCache<Arc<EpisodeDetails>>,
    server_sources: TtlCache<Arc<Vec<SourceCandidate>>>,
    streams: TtlCache<ResolvedStream>,
}

impl EpisodeService {
    /// Builds the service on top of a real HTTP client.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        install_rustls_provider();
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: ResolverConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        let resolver = StreamResolver::new(Arc::clone(&fetcher), &config);
        Self {
            config,
            fetcher,
            resolver,
            episodes: TtlCache::new(),
            server_sources: TtlCache::new(),
            streams: TtlCache::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolver(&self) -> &StreamResolver {
        &self.resolver
    }

    pub fn episode_url(&self, episode_id: &str) -> String {
        build_url(&self.config.base_url, &format!("/episode/{episode_id}/"))
    }

    /// Fetches and parses an episode page, cached for the episode TTL.
    pub async fn scrape_episode(&self, episode_id: &str) -> Result<Arc<EpisodeDetails>> {
        let key = generate_key(Operation::Episode.as_str(), [episode_id]);
        if let Some(details) = self.episodes.get(&key) {
            debug!(episode_id, "Episode cache hit");
            return Ok(details);
        }

        let url = self.episode_url(episode_id);
        let html = self.fetcher.fetch_html(&url, &RequestHeaders::default()).await?;
        let details = Arc::new(parse_episode_page(episode_id, &html, &self.config.base_url));
        debug!(
            episode_id,
            sources = details.sources.len(),
            servers = details.servers.len(),
            "Parsed episode page"
        );

        self.episodes
            .set(key, Arc::clone(&details), self.config.cache.episode());
        Ok(details)
    }

    /// Iframe candidates of one listed server of an episode.
    ///
    /// An unknown server, or one without a url, yields an empty list.
    pub async fn episode_server(
        &self,
        episode_id: &str,
        server_id: &str,
    ) -> Result<Arc<Vec<SourceCandidate>>> {
        let key = generate_key(Operation::EpisodeServer.as_str(), [episode_id, server_id]);
        if let Some(sources) = self.server_sources.get(&key) {
            return Ok(sources);
        }

        let episode = self.scrape_episode(episode_id).await?;
        let Some(server) = episode
            .servers
            .iter()
            .find(|s| s.id == server_id && !s.url.is_empty())
        else {
            debug!(episode_id, server_id, "Server not listed on episode page");
            return Ok(Arc::new(Vec::new()));
        };

        let html = self
            .fetcher
            .fetch_html(&server.url, &RequestHeaders::default())
            .await?;
        let sources = Arc::new(parse_server_page(
            &html,
            &self.config.base_url,
            &server.name,
        ));

        self.server_sources
            .set(key, Arc::clone(&sources), self.config.cache.episode());
        Ok(sources)
    }

    /// Resolves an episode id into a playable stream.
    ///
    /// "No stream found" is an `Ok` unresolved result and is cached for the
    /// negative TTL. Transport failures while loading the episode page are
    /// returned as errors.
    pub async fn resolve_episode_stream(&self, episode_id: &str) -> Result<ResolvedStream> {
        let key = generate_key(Operation::Stream.as_str(), [episode_id]);
        if let Some(stream) = self.streams.get(&key) {
            debug!(episode_id, "Stream cache hit");
            return Ok(stream);
        }

        let episode = self.scrape_episode(episode_id).await?;
        let stream = self.select_stream(episode_id, &episode.sources).await;

        let ttl = if stream.success {
            self.config.cache.stream()
        } else {
            self.config.cache.negative_stream()
        };
        self.streams.set(key, stream.clone(), ttl);

        info!(
            episode_id,
            success = stream.success,
            media_kind = %stream.media_kind,
            "Episode stream resolved"
        );
        Ok(stream)
    }

    /// First iframe candidate through the resolver, then the first direct
    /// candidate as-is.
    async fn select_stream(&self, episode_id: &str, sources: &[SourceCandidate]) -> ResolvedStream {
        if let Some(iframe) = sources.iter().find(|s| s.kind == MediaKind::Iframe) {
            let mut headers = RequestHeaders::default();
            headers.insert("Referer".to_string(), self.episode_url(episode_id));
            let stream = self.resolver.resolve(&iframe.url, Some(&headers)).await;
            if stream.success {
                return stream;
            }
            debug!(episode_id, url = %iframe.url, "Iframe candidate did not resolve");
        }

        sources
            .iter()
            .find(|s| s.kind.is_direct())
            .map(|s| ResolvedStream::found(s.url.clone(), s.kind))
            .unwrap_or_else(ResolvedStream::unresolved)
    }

    /// Drops every cached episode, server list and stream.
    pub fn clear_cache(&self) {
        self.episodes.clear();
        self.server_sources.clear();
        self.streams.clear();
    }

    /// Evicts expired entries from every cache, returning how many were
    /// removed.
    pub fn cleanup_expired(&self) -> usize {
        self.episodes.cleanup_expired()
            + self.server_sources.cleanup_expired()
            + self.streams.cleanup_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, ResolverError};
    use crate::test_utils::MockFetcher;

    const EPISODE_URL: &str = "https://watchanimeworld.in/episode/bleach-1x13/";

    fn service(fetcher: Arc<MockFetcher>) -> EpisodeService {
        EpisodeService::with_fetcher(ResolverConfig::default(), fetcher)
    }

    fn episode_page(body: &str) -> String {
        format!(r#"<html><body><article><h1 class="title">Bleach 1x13</h1>{body}</article></body></html>"#)
    }

    #[tokio::test]
    async fn resolves_iframe_candidate_and_caches_result() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page(
                    EPISODE_URL,
                    episode_page(r#"<iframe src="https://player.example/embed/abc"></iframe>"#),
                )
                .with_page(
                    "https://player.example/embed/abc",
                    r#"<script>jwplayer("p").setup({file:"https://cdn.example/video.m3u8"});</script>"#,
                ),
        );
        let service = service(fetcher.clone());

        let first = service.resolve_episode_stream("bleach-1x13").await.unwrap();
        assert_eq!(
            first,
            ResolvedStream::found("https://cdn.example/video.m3u8", MediaKind::Hls)
        );
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::json!({
                "success": true,
                "streamUrl": "https://cdn.example/video.m3u8",
                "mediaKind": "hls"
            })
        );
        let calls = fetcher.calls();
        assert_eq!(calls, 2);

        let second = service.resolve_episode_stream("bleach-1x13").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn sends_episode_page_as_referer() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page(
                    EPISODE_URL,
                    episode_page(r#"<iframe src="https://player.example/embed/abc"></iframe>"#),
                )
                .with_page(
                    "https://player.example/embed/abc",
                    r#"<video src="https://cdn.example/a.mp4"></video>"#,
                ),
        );
        service(fetcher.clone())
            .resolve_episode_stream("bleach-1x13")
            .await
            .unwrap();
        let headers = fetcher.headers_for("https://player.example/embed/abc").unwrap();
        assert_eq!(headers.get("Referer").map(String::as_str), Some(EPISODE_URL));
    }

    #[tokio::test]
    async fn falls_back_to_direct_candidate() {
        let fetcher = Arc::new(MockFetcher::new().with_page(
            EPISODE_URL,
            episode_page(
                r#"<iframe src="https://dead.example/embed/x"></iframe>
                   <div class="video-player" data-video="https://cdn.example/direct.mp4"></div>"#,
            ),
        ));
        let stream = service(fetcher)
            .resolve_episode_stream("bleach-1x13")
            .await
            .unwrap();
        assert_eq!(
            stream,
            ResolvedStream::found("https://cdn.example/direct.mp4", MediaKind::Mp4)
        );
    }

    #[tokio::test]
    async fn unresolved_result_is_cached() {
        let fetcher = Arc::new(MockFetcher::new().with_page(EPISODE_URL, episode_page("")));
        let service = service(fetcher.clone());

        let stream = service.resolve_episode_stream("bleach-1x13").await.unwrap();
        assert_eq!(stream, ResolvedStream::unresolved());
        let calls = fetcher.calls();

        service.resolve_episode_stream("bleach-1x13").await.unwrap();
        assert_eq!(fetcher.calls(), calls);
    }

    #[tokio::test]
    async fn episode_fetch_failure_propagates() {
        let fetcher = Arc::new(MockFetcher::new());
        let err = service(fetcher)
            .resolve_episode_stream("missing-1x1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Fetch(FetchError::Status { .. })
        ));
    }

    #[tokio::test]
    async fn episode_details_are_cached() {
        let fetcher = Arc::new(MockFetcher::new().with_page(EPISODE_URL, episode_page("")));
        let service = service(fetcher.clone());
        let first = service.scrape_episode("bleach-1x13").await.unwrap();
        let second = service.scrape_episode("bleach-1x13").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.title, "Bleach 1x13");
        assert_eq!(fetcher.calls(), 1);

        service.clear_cache();
        service.scrape_episode("bleach-1x13").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn episode_server_sources() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .with_page(
                    EPISODE_URL,
                    episode_page(
                        r#"<ul><li class="server-option" data-server="2" data-url="/servers/2">Mirror</li></ul>"#,
                    ),
                )
                .with_page(
                    "https://watchanimeworld.in/servers/2",
                    r#"<iframe src="https://mirror.example/embed/9"></iframe>"#,
                ),
        );
        let service = service(fetcher.clone());

        let sources = service.episode_server("bleach-1x13", "2").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://mirror.example/embed/9");
        assert_eq!(sources[0].label.as_deref(), Some("Mirror"));

        let unknown = service.episode_server("bleach-1x13", "7").await.unwrap();
        assert!(unknown.is_empty());

        service.episode_server("bleach-1x13", "2").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }
}
