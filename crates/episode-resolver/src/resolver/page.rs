use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::strategies::{ScriptMatch, scan_script};
use crate::extractor::utils::resolve_against;
use crate::media::{MediaKind, ResolvedStream};

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
static VIDEO_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video source[src]").unwrap());
static VIDEO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("video[src]").unwrap());
static IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe").unwrap());

/// What a single fetched page contributes to a resolution.
#[derive(Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// A media url was found.
    Found {
        stream: ResolvedStream,
        strategy: &'static str,
    },
    /// No media, but the page embeds another frame worth following.
    Frame(String),
    Miss,
}

fn is_blank_frame(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url.eq_ignore_ascii_case("about:blank") || url.starts_with("javascript:")
}

/// Runs the script strategies, the video-tag fallback and the nested-frame
/// lookup over one page, in that order.
pub fn analyze_page(page_url: &str, base_url: &str, html: &str) -> PageOutcome {
    let document = Html::parse_document(html);

    for script in document.select(&SCRIPT) {
        let text = script.text().collect::<String>();
        if text.trim().is_empty() {
            continue;
        }
        if let Some(ScriptMatch {
            url,
            kind,
            strategy,
        }) = scan_script(&text)
        {
            return PageOutcome::Found {
                stream: ResolvedStream::found(url, kind),
                strategy,
            };
        }
    }

    let video_src = document
        .select(&VIDEO_SOURCE)
        .chain(document.select(&VIDEO))
        .filter_map(|el| el.value().attr("src"))
        .find(|src| !src.trim().is_empty());
    if let Some(src) = video_src {
        let url = resolve_against(page_url, base_url, src);
        let kind = MediaKind::infer_resolved(&url);
        return PageOutcome::Found {
            stream: ResolvedStream::found(url, kind),
            strategy: "video-tag",
        };
    }

    let frame = document
        .select(&IFRAME)
        .filter_map(|el| el.value().attr("src").or_else(|| el.value().attr("data-src")))
        .find(|src| !is_blank_frame(src))
        .map(|src| resolve_against(page_url, base_url, src));
    match frame {
        Some(next) if next != page_url => PageOutcome::Frame(next),
        _ => PageOutcome::Miss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://watchanimeworld.in";

    #[test]
    fn scripts_are_scanned_in_document_order() {
        let html = r#"
            <script>var analytics = 1;</script>
            <script>jwplayer().setup({file:"https://cdn.example/first.m3u8"});</script>
            <script>var other = "https://cdn.example/second.m3u8";</script>
        "#;
        match analyze_page("https://player.example/e/1", BASE, html) {
            PageOutcome::Found { stream, strategy } => {
                assert_eq!(stream.url(), Some("https://cdn.example/first.m3u8"));
                assert_eq!(stream.media_kind, MediaKind::Hls);
                assert_eq!(strategy, "m3u8");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_video_tag() {
        let html = r#"<video controls><source src="../media/ep.mp4" type="video/mp4"></video>"#;
        assert_eq!(
            analyze_page("https://player.example/e/1", BASE, html),
            PageOutcome::Found {
                stream: ResolvedStream::found("https://player.example/media/ep.mp4", MediaKind::Mp4),
                strategy: "video-tag",
            }
        );
    }

    #[test]
    fn video_tag_without_known_extension_is_other() {
        let html = r#"<video src="/stream/42"></video>"#;
        match analyze_page("https://player.example/e/1", BASE, html) {
            PageOutcome::Found { stream, .. } => {
                assert_eq!(stream.url(), Some("https://player.example/stream/42"));
                assert_eq!(stream.media_kind, MediaKind::Other);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn follows_first_non_blank_frame() {
        let html = r#"
            <iframe src="about:blank"></iframe>
            <iframe src="//inner.example/embed/2"></iframe>
            <iframe src="https://third.example/embed/3"></iframe>
        "#;
        assert_eq!(
            analyze_page("https://player.example/e/1", BASE, html),
            PageOutcome::Frame("https://inner.example/embed/2".to_string())
        );
    }

    #[test]
    fn self_referencing_frame_is_a_miss() {
        let html = r#"<iframe src="https://player.example/e/1"></iframe>"#;
        assert_eq!(
            analyze_page("https://player.example/e/1", BASE, html),
            PageOutcome::Miss
        );
    }

    #[test]
    fn empty_page_is_a_miss() {
        assert_eq!(
            analyze_page("https://player.example/e/1", BASE, "<html></html>"),
            PageOutcome::Miss
        );
    }
}
