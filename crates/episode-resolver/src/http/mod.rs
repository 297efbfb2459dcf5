//! Resilient fetch layer.
//!
//! [`HttpFetcher`] keeps a single cookie store for the process, rotates the
//! user agent per request, enforces a request timeout and retries transient
//! failures with linearly increasing delays.

pub mod retry;
pub mod user_agent;

use std::str::FromStr;
use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::FetchError;

pub use retry::{RetryPolicy, retry_with_backoff};
pub use user_agent::UserAgentPool;

/// Extra request headers, e.g. `Referer`.
pub type RequestHeaders = FxHashMap<String, String>;

/// Source of page bodies for the extraction and resolution layers.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` as text, sending `headers` on every attempt.
    async fn fetch_html(&self, url: &str, headers: &RequestHeaders) -> Result<String, FetchError>;
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Browser-like headers sent with every page request.
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    // Do not set `Accept-Encoding` here.
    // Reqwest auto-adds it (and auto-decompresses) when the corresponding
    // crate features are enabled, as long as we don't override the header.
    headers
}

pub fn create_client_builder(config: &ResolverConfig) -> ClientBuilder {
    Client::builder()
        .cookie_store(true)
        // Caller-supplied `Referer` must survive redirects.
        .referer(false)
        .default_headers(default_headers())
        .timeout(config.request.timeout())
}

/// `reqwest`-backed [`PageFetcher`].
///
/// Clones share the same connection pool and cookie store.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    user_agents: UserAgentPool,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        install_rustls_provider();
        let client = create_client_builder(config)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self::with_client(
            client,
            UserAgentPool::new(config.user_agents.clone()),
            RetryPolicy::new(config.request.max_retries, config.request.retry_delay()),
        ))
    }

    pub fn with_client(client: Client, user_agents: UserAgentPool, retry: RetryPolicy) -> Self {
        Self {
            client,
            user_agents,
            retry,
        }
    }

    async fn fetch_once(&self, url: &str, headers: &HeaderMap) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, self.user_agents.pick())
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}

/// Converts caller headers, skipping names or values reqwest would reject.
fn to_header_map(headers: &RequestHeaders) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        match (HeaderName::from_str(key), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => debug!(header = %key, "Invalid header; skipping"),
        }
    }
    map
}

fn validate_url(url: &str) -> Result<(), FetchError> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str, headers: &RequestHeaders) -> Result<String, FetchError> {
        validate_url(url)?;
        let headers = to_header_map(headers);
        debug!(url = %url, "Fetching page");
        retry_with_backoff(&self.retry, url, |_| self.fetch_once(url, &headers)).await
    }
}
