use serde::{Deserialize, Serialize};

/// Streaming format of a url.
///
/// `Iframe` only describes candidates that still need resolving; a resolved
/// stream is never reported as `Iframe`. `None` marks an unresolved result.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Hls,
    Mp4,
    Iframe,
    Other,
    None,
}

impl MediaKind {
    /// Infers the kind from url substrings.
    pub fn infer(url: &str) -> Self {
        if url.contains(".m3u8") {
            MediaKind::Hls
        } else if url.contains(".mp4") {
            MediaKind::Mp4
        } else if url.contains("iframe") || url.contains("embed") {
            MediaKind::Iframe
        } else {
            MediaKind::Other
        }
    }

    /// Like [`MediaKind::infer`], but never yields `Iframe`.
    pub fn infer_resolved(url: &str) -> Self {
        match Self::infer(url) {
            MediaKind::Iframe => MediaKind::Other,
            kind => kind,
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, MediaKind::Hls | MediaKind::Mp4)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Hls => "hls",
            MediaKind::Mp4 => "mp4",
            MediaKind::Iframe => "iframe",
            MediaKind::Other => "other",
            MediaKind::None => "none",
        }
    }

    /// Content type a proxy should fall back to when the upstream omits one.
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Hls => "application/vnd.apple.mpegurl",
            MediaKind::Mp4 => "video/mp4",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
