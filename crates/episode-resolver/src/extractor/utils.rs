use std::sync::LazyLock;

use regex::Regex;

use crate::media::MediaKind;

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static ID_FROM_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:series|episode|movies?)/([^/?#]+)").unwrap());
static SEASON_X_EPISODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)x(\d+)").unwrap());
static SEASON_EPISODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d+)e(\d+)").unwrap());
static EPISODE_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)episode[\s-]+(\d+)").unwrap());
static QUALITY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+p)").unwrap());

/// Trims and collapses runs of whitespace into single spaces.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Joins a site-relative path onto `base_url`; absolute urls pass through.
pub fn build_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Makes `url` absolute against `base_url`.
///
/// Protocol-relative urls (`//host/path`) get `https:`. Empty input stays
/// empty.
pub fn normalize_url(base_url: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }
    build_url(base_url, url)
}

/// Resolves `url` relative to the page it was found on, falling back to
/// [`normalize_url`] when the page url cannot be parsed.
pub fn resolve_against(page_url: &str, base_url: &str, url: &str) -> String {
    let trimmed = url.trim();
    match url::Url::parse(page_url).and_then(|page| page.join(trimmed)) {
        Ok(joined) if matches!(joined.scheme(), "http" | "https") => joined.to_string(),
        _ => normalize_url(base_url, trimmed),
    }
}

/// Extracts the slug from series, episode and movie urls.
///
/// `https://watchanimeworld.in/series/bleach/` -> `bleach`
pub fn extract_id_from_url(url: &str) -> Option<String> {
    ID_FROM_URL_REGEX
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Season and episode numbers from `1x13`, `S1E13` or `Episode 13`.
///
/// Defaults to season 1, episode 1.
pub fn parse_episode_number(text: &str) -> (u32, u32) {
    for re in [&*SEASON_X_EPISODE_REGEX, &*SEASON_EPISODE_REGEX] {
        if let Some(caps) = re.captures(text)
            && let (Ok(season), Ok(episode)) = (caps[1].parse(), caps[2].parse())
        {
            return (season, episode);
        }
    }

    if let Some(episode) = EPISODE_WORD_REGEX
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
    {
        return (1, episode);
    }

    (1, 1)
}

/// `1080p` stays `1080p`; `HD` maps to `720p`, `SD` to `480p`.
pub fn extract_quality(text: &str) -> String {
    if let Some(m) = QUALITY_REGEX.captures(text).and_then(|caps| caps.get(1)) {
        return m.as_str().to_string();
    }
    let lower = text.to_lowercase();
    if lower.contains("hd") {
        "720p".to_string()
    } else if lower.contains("sd") {
        "480p".to_string()
    } else {
        "unknown".to_string()
    }
}

#[inline]
pub fn video_type(url: &str) -> MediaKind {
    MediaKind::infer(url)
}
