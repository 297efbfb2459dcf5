//! Episode page extraction.
//!
//! Parsing is synchronous: `scraper::Html` is not `Send`, so documents are
//! parsed and dropped before the caller awaits anything else.

use std::sync::LazyLock;

use rustc_hash::FxHashSet;
use scraper::{ElementRef, Html, Selector};

use super::utils::{clean_text, extract_quality, normalize_url, parse_episode_number};
use crate::media::{DownloadLink, EpisodeDetails, Server, SourceCandidate};

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1.title, .single-post h1, article h1"));
static THUMBNAIL: LazyLock<Selector> = LazyLock::new(|| selector(".thumbnail img, article img"));
static IFRAME: LazyLock<Selector> = LazyLock::new(|| selector("iframe"));
static PLAYER: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".player-container, .video-player, [class*="player"]"#));
static SERVER: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".server-option, .player-option, [class*="server"]"#));
static DOWNLOAD: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#".download-link, .download-option, a[download], [class*="download"] a"#)
});

fn first_attr<'a>(element: &ElementRef<'a>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Ordered candidate list that ignores urls it has already seen.
#[derive(Default)]
struct Candidates {
    seen: FxHashSet<String>,
    items: Vec<SourceCandidate>,
}

impl Candidates {
    fn push(&mut self, url: String, label: Option<String>) {
        if url.is_empty() || !self.seen.insert(url.clone()) {
            return;
        }
        self.items.push(SourceCandidate::new(url, label));
    }
}

/// Extracts metadata, source candidates, servers and downloads from an
/// episode page.
pub fn parse_episode_page(id: &str, html: &str, base_url: &str) -> EpisodeDetails {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .unwrap_or_default();

    let thumbnail = document
        .select(&THUMBNAIL)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|src| normalize_url(base_url, src))
        .filter(|src| !src.is_empty());

    let (season_number, episode_number) = parse_episode_number(id);

    let mut sources = Candidates::default();

    for iframe in document.select(&IFRAME) {
        if let Some(src) = first_attr(&iframe, &["src", "data-src"]) {
            sources.push(normalize_url(base_url, src), None);
        }
    }

    for player in document.select(&PLAYER) {
        if let Some(data_url) = first_attr(&player, &["data-url", "data-src", "data-video"]) {
            sources.push(normalize_url(base_url, data_url), None);
        }
        for iframe in player.select(&IFRAME) {
            if let Some(src) = first_attr(&iframe, &["src", "data-src"]) {
                sources.push(normalize_url(base_url, src), None);
            }
        }
    }

    let servers = document
        .select(&SERVER)
        .filter_map(|el| {
            let server_id = first_attr(&el, &["data-id", "data-server"])?;
            let name = clean_text(&el.text().collect::<String>());
            if name.is_empty() {
                return None;
            }
            let url = first_attr(&el, &["data-url", "href"])
                .map(|u| normalize_url(base_url, u))
                .unwrap_or_default();
            Some(Server {
                id: server_id.to_string(),
                name,
                url,
            })
        })
        .collect();

    let downloads = document
        .select(&DOWNLOAD)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            if !href.contains("http") {
                return None;
            }
            let text = clean_text(&el.text().collect::<String>());
            Some(DownloadLink {
                url: href.to_string(),
                quality: extract_quality(&text),
            })
        })
        .collect();

    EpisodeDetails {
        id: id.to_string(),
        title,
        episode_number,
        season_number,
        thumbnail,
        sources: sources.items,
        servers,
        downloads,
    }
}

/// Iframe candidates on a server page, labelled with the server name.
pub fn parse_server_page(html: &str, base_url: &str, server_name: &str) -> Vec<SourceCandidate> {
    let document = Html::parse_document(html);
    let mut sources = Candidates::default();
    for iframe in document.select(&IFRAME) {
        if let Some(src) = first_attr(&iframe, &["src", "data-src"]) {
            sources.push(normalize_url(base_url, src), Some(server_name.to_string()));
        }
    }
    sources.items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;

    const BASE: &str = "https://watchanimeworld.in";

    const EPISODE_PAGE: &str = r#"
        <html><body>
          <article>
            <h1 class="title">  Bleach:
                Thousand-Year Blood War  </h1>
            <div class="thumbnail"><img src="/wp-content/uploads/bleach.jpg"></div>
            <div class="video-player" data-video="https://cdn.example/direct.mp4">
              <iframe data-src="https://player.example/embed/abc"></iframe>
            </div>
            <iframe src="https://player.example/embed/abc"></iframe>
            <iframe src="//mirror.example/embed/def"></iframe>
            <ul>
              <li class="server-option" data-server="1" data-url="/servers/1">Server  One</li>
              <li class="server-option" data-id="2">  </li>
            </ul>
            <div class="download-box">
              <a href="https://files.example/ep13-1080.mkv">Download 1080p</a>
              <a href="/local/ep13.mkv">Download SD</a>
            </div>
          </article>
        </body></html>
    "#;

    #[test]
    fn parses_metadata() {
        let details = parse_episode_page("bleach-1x13", EPISODE_PAGE, BASE);
        assert_eq!(details.id, "bleach-1x13");
        assert_eq!(details.title, "Bleach: Thousand-Year Blood War");
        assert_eq!(details.season_number, 1);
        assert_eq!(details.episode_number, 13);
        assert_eq!(
            details.thumbnail.as_deref(),
            Some("https://watchanimeworld.in/wp-content/uploads/bleach.jpg")
        );
    }

    #[test]
    fn collects_candidates_in_document_order_without_duplicates() {
        let details = parse_episode_page("bleach-1x13", EPISODE_PAGE, BASE);
        let urls: Vec<_> = details.sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://player.example/embed/abc",
                "https://mirror.example/embed/def",
                "https://cdn.example/direct.mp4",
            ]
        );
        assert_eq!(details.sources[0].kind, MediaKind::Iframe);
        assert_eq!(details.sources[2].kind, MediaKind::Mp4);
    }

    #[test]
    fn parses_servers_and_downloads() {
        let details = parse_episode_page("bleach-1x13", EPISODE_PAGE, BASE);
        assert_eq!(
            details.servers,
            vec![Server {
                id: "1".to_string(),
                name: "Server One".to_string(),
                url: "https://watchanimeworld.in/servers/1".to_string(),
            }]
        );
        assert_eq!(
            details.downloads,
            vec![DownloadLink {
                url: "https://files.example/ep13-1080.mkv".to_string(),
                quality: "1080p".to_string(),
            }]
        );
    }

    #[test]
    fn empty_page_yields_defaults() {
        let details = parse_episode_page("special", "<html></html>", BASE);
        assert!(details.title.is_empty());
        assert!(details.thumbnail.is_none());
        assert!(details.sources.is_empty());
        assert_eq!((details.season_number, details.episode_number), (1, 1));
    }

    #[test]
    fn server_page_candidates_carry_server_label() {
        let html = r#"<iframe src="https://player.example/embed/zzz"></iframe>"#;
        let sources = parse_server_page(html, BASE, "Server One");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].label.as_deref(), Some("Server One"));
        assert_eq!(sources[0].kind, MediaKind::Iframe);
    }
}
