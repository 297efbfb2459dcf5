//! Inline-script extraction strategies.
//!
//! Each strategy is a pure function over script text. They are tried in a
//! fixed order and the first hit wins.

use std::sync::LazyLock;

use regex::Regex;

use super::unpacker;
use crate::media::MediaKind;

/// A media url found in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMatch {
    pub url: String,
    pub kind: MediaKind,
    pub strategy: &'static str,
}

type Strategy = fn(&str) -> Option<ScriptMatch>;

/// Strategies in priority order.
pub const SCRIPT_STRATEGIES: &[Strategy] = &[find_hls_url, find_mp4_url, find_file_property];

// Path separators may be JSON-escaped (`https:\/\/host\/a.m3u8`).
static HLS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?:\\?/\\?/[^\s"'<>`]+?\.m3u8[^\s"'<>`]*"#).unwrap()
});
static MP4_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?:\\?/\\?/[^\s"'<>`]+?\.mp4[^\s"'<>`]*"#).unwrap()
});
static FILE_PROPERTY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?(?:file|source|src)["']?\s*:\s*["']([^"']+)["']"#).unwrap()
});

/// Demo and placeholder media shipped with common player setups.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "placeholder",
    "blank.mp4",
    "sample-videos.com",
    "test-videos.co.uk",
    "commondatastorage.googleapis.com/gtv-videos-bucket/sample",
    "/demo/",
];

const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".vtt"];

/// Unescapes JSON-style separators and drops trailing escape residue.
fn clean_script_url(raw: &str) -> String {
    raw.replace("\\/", "/")
        .replace("\\u0026", "&")
        .trim_end_matches('\\')
        .to_string()
}

pub fn find_hls_url(text: &str) -> Option<ScriptMatch> {
    HLS_URL_REGEX.find(text).map(|m| ScriptMatch {
        url: clean_script_url(m.as_str()),
        kind: MediaKind::Hls,
        strategy: "m3u8",
    })
}

pub fn find_mp4_url(text: &str) -> Option<ScriptMatch> {
    MP4_URL_REGEX.find(text).map(|m| ScriptMatch {
        url: clean_script_url(m.as_str()),
        kind: MediaKind::Mp4,
        strategy: "mp4",
    })
}

pub fn find_file_property(text: &str) -> Option<ScriptMatch> {
    FILE_PROPERTY_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_script_url(m.as_str()))
        .find(|url| is_playable_property(url))
        .map(|url| ScriptMatch {
            kind: MediaKind::infer_resolved(&url),
            url,
            strategy: "file-property",
        })
}

fn is_playable_property(url: &str) -> bool {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or(&lower);
    if SUBTITLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }
    !PLACEHOLDER_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn run_strategies(text: &str) -> Option<ScriptMatch> {
    SCRIPT_STRATEGIES.iter().find_map(|strategy| strategy(text))
}

/// Applies every strategy to one script block, then to its unpacked form if
/// the block is packed.
pub fn scan_script(script: &str) -> Option<ScriptMatch> {
    if let Some(found) = run_strategies(script) {
        return Some(found);
    }

    if !unpacker::is_packed(script) {
        return None;
    }
    let unpacked = unpacker::unpack(script);
    if unpacked.is_empty() {
        return None;
    }
    run_strategies(&unpacked)
}
