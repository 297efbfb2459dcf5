//! Resolver configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it wants to
//! override:
//!
//! ```toml
//! base_url = "https://watchanimeworld.in"
//! max_depth = 5
//!
//! [request]
//! timeout_secs = 30
//! max_retries = 3
//! retry_delay_ms = 1000
//!
//! [cache]
//! episode_secs = 3600
//! negative_stream_secs = 300
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ResolverError, Result};

pub const DEFAULT_BASE_URL: &str = "https://watchanimeworld.in";

/// Maximum number of frames followed by a single resolution.
pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root of the upstream site. Relative links are joined onto it and it is
    /// sent as `Referer` when following redirect descriptors.
    pub base_url: String,
    pub request: RequestConfig,
    pub cache: CacheTtlConfig,
    /// Pool of user agents, one is picked at random for every request.
    pub user_agents: Vec<String>,
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request: RequestConfig::default(),
            cache: CacheTtlConfig::default(),
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ],
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ResolverConfig =
            toml::from_str(input).map_err(|e| ResolverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ResolverError::Config(format!(
                "base_url must be an absolute http(s) url, got `{}`",
                self.base_url
            )));
        }
        if self.user_agents.is_empty() {
            return Err(ResolverError::Config(
                "user_agents must contain at least one entry".to_string(),
            ));
        }
        Ok(())
    }

    /// `base_url` with a trailing slash, used as the fixed referer for
    /// redirect descriptors.
    pub fn referer(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay, the n-th retry waits `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Per-operation cache lifetimes, in seconds.
///
/// `home`, `search`, `anime` and `category` complete the TTL table for the
/// listing pages; this crate only caches episodes and streams.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheTtlConfig {
    pub home_secs: u64,
    pub search_secs: u64,
    pub anime_secs: u64,
    pub episode_secs: u64,
    pub stream_secs: u64,
    pub category_secs: u64,
    /// Lifetime of "no stream found" results.
    pub negative_stream_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            home_secs: 5 * 60,
            search_secs: 10 * 60,
            anime_secs: 30 * 60,
            episode_secs: 60 * 60,
            stream_secs: 60 * 60,
            category_secs: 15 * 60,
            negative_stream_secs: 5 * 60,
        }
    }
}

impl CacheTtlConfig {
    pub fn episode(&self) -> Duration {
        Duration::from_secs(self.episode_secs)
    }

    pub fn stream(&self) -> Duration {
        Duration::from_secs(self.stream_secs)
    }

    pub fn negative_stream(&self) -> Duration {
        Duration::from_secs(self.negative_stream_secs)
    }
}
