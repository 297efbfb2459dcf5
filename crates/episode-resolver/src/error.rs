use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the fetch layer.
///
/// Network failures, timeouts and 5xx responses are transient and retried by
/// [`crate::http::HttpFetcher`]; once the retry budget is spent the last
/// transient error is wrapped in [`FetchError::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("failed to build http client: {0}")]
    ClientBuild(String),

    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether the error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Timeout { .. } => true,
            FetchError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source,
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ResolverError> = std::result::Result<T, E>;
