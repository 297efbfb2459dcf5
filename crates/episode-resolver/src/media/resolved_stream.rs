use serde::{Deserialize, Serialize};

use super::MediaKind;

/// Terminal output of a resolution.
///
/// An unresolved stream has `success == false`, no url and kind `none`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStream {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    pub media_kind: MediaKind,
}

impl ResolvedStream {
    pub fn found(stream_url: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            success: true,
            stream_url: Some(stream_url.into()),
            media_kind,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            success: false,
            stream_url: None,
            media_kind: MediaKind::None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.stream_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_api_shape() {
        let stream = ResolvedStream::found("https://cdn.example/video.m3u8", MediaKind::Hls);
        let json = serde_json::to_value(&stream).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "streamUrl": "https://cdn.example/video.m3u8",
                "mediaKind": "hls",
            })
        );
    }

    #[test]
    fn unresolved_has_no_url() {
        let json = serde_json::to_value(ResolvedStream::unresolved()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "mediaKind": "none" })
        );
    }
}
