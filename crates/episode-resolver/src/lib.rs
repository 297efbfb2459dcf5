//! Resolves anime episode ids into playable stream urls.
//!
//! The pipeline runs in one direction: the episode page is fetched and parsed
//! into source candidates, the preferred candidate is walked by the
//! [`StreamResolver`] through embedded players, redirect descriptors and
//! packed scripts, and the outcome is cached by [`EpisodeService`].

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod http;
pub mod media;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cache::{Operation, TtlCache, generate_key};
pub use config::ResolverConfig;
pub use error::{FetchError, ResolverError, Result};
pub use http::{HttpFetcher, PageFetcher, RequestHeaders};
pub use media::{EpisodeDetails, MediaKind, ResolvedStream, SourceCandidate};
pub use resolver::{ResolutionContext, StreamResolver};
pub use service::EpisodeService;
