//! Redirect descriptors: player urls that carry their real sources as a
//! base64-encoded JSON list in the `data` query parameter.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use thiserror::Error;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a link list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct DescriptorLink {
    #[serde(default)]
    link: String,
}

/// Returns the raw `data` payload if `url` is a redirect descriptor.
pub fn descriptor_payload(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    if !parsed.path().to_ascii_lowercase().contains("player") {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "data")
        // Form decoding turns a literal `+` into a space.
        .map(|(_, value)| value.replace(' ', "+"))
        .filter(|value| !value.is_empty())
}

/// Decodes a descriptor payload into its links, in order. Empty links are
/// dropped.
pub fn decode_links(payload: &str) -> Result<Vec<String>, DescriptorError> {
    let payload = payload.trim();
    let bytes = STANDARD_LENIENT
        .decode(payload)
        .or_else(|_| URL_SAFE_LENIENT.decode(payload))?;
    let links: Vec<DescriptorLink> = serde_json::from_slice(&bytes)?;
    Ok(links
        .into_iter()
        .map(|l| l.link.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
