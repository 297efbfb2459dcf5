use serde::{Deserialize, Serialize};

use super::MediaKind;

/// A url listed on an episode page that may lead to playable media.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    pub url: String,
    pub kind: MediaKind,
    /// Quality or server label shown on the page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SourceCandidate {
    /// Creates a candidate whose kind is inferred from the url.
    pub fn new(url: impl Into<String>, label: Option<String>) -> Self {
        let url = url.into();
        let kind = MediaKind::infer(&url);
        Self { url, kind, label }
    }
}
