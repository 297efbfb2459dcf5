use serde::{Deserialize, Serialize};

use super::SourceCandidate;

/// Structured content of an episode page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDetails {
    pub id: String,
    pub title: String,
    pub episode_number: u32,
    pub season_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Candidates in document order, duplicates removed.
    pub sources: Vec<SourceCandidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<DownloadLink>,
}

/// A selectable player server listed on the episode page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub quality: String,
}
