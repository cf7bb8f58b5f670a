//! Search results page scraped for image CDN links (Pinterest-compatible).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use shelfshot_core::{ImageCandidate, ImageSource, Provider, SearchRequest};

use crate::client::Throttle;

pub const DEFAULT_SEARCH_URL: &str = "https://www.pinterest.com/search/pins/";

/// Rendition requested for every scraped image.
const LARGE_RENDITION: &str = "736x";

const PIN_IMAGE_PATTERN: &str = r#"(?i)https://i\.pinimg\.com/[A-Za-z0-9_./-]+?\.(?:jpe?g|png|webp)\b"#;
const SIZE_SEGMENT_PATTERN: &str = r"^\d+x(?:\d+)?$";

static PIN_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PIN_IMAGE_PATTERN).expect("static pattern"));

static SIZE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SIZE_SEGMENT_PATTERN).expect("static pattern"));

/// Swap the leading size segment (`236x`, `474x`, `60x60`) for the large
/// rendition. URLs without one (`originals`) are returned unchanged.
pub fn upscale_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("https://i.pinimg.com/") else {
        return url.to_string();
    };
    let Some((segment, tail)) = rest.split_once('/') else {
        return url.to_string();
    };
    if SIZE_SEGMENT_RE.is_match(segment) {
        format!("https://i.pinimg.com/{}/{}", LARGE_RENDITION, tail)
    } else {
        url.to_string()
    }
}

/// Extract up to `max` distinct CDN image URLs from a results page, in the
/// order they first appear.
///
/// JSON-escaped slashes (`https:\/\/i.pinimg.com\/...`) embedded in page
/// state are handled.
pub fn extract_image_urls(html: &str, max: usize) -> Vec<String> {
    let text = html.replace("\\/", "/");
    let mut urls: Vec<String> = Vec::new();
    for m in PIN_IMAGE_RE.find_iter(&text) {
        let url = upscale_url(m.as_str());
        if !urls.contains(&url) {
            urls.push(url);
            if urls.len() >= max {
                break;
            }
        }
    }
    urls
}

pub struct HtmlScrapeSource {
    http: reqwest::Client,
    search_url: String,
    throttle: Throttle,
}

impl HtmlScrapeSource {
    /// `http` should carry a browser-like user agent and the search timeout.
    pub fn new(http: reqwest::Client, throttle: Throttle) -> Self {
        Self {
            http,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            throttle,
        }
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }
}

#[async_trait]
impl ImageSource for HtmlScrapeSource {
    fn provider(&self) -> Provider {
        Provider::HtmlScrape
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
        self.throttle.wait().await;

        let resp = match self
            .http
            .get(&self.search_url)
            .query(&[("q", request.query)])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Page scrape failed for '{}': {}", request.query, e);
                return Vec::new();
            }
        };
        if !resp.status().is_success() {
            log::warn!(
                "Page scrape returned HTTP {} for '{}'",
                resp.status().as_u16(),
                request.query
            );
            return Vec::new();
        }
        let html = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Page scrape body unreadable for '{}': {}", request.query, e);
                return Vec::new();
            }
        };

        let urls = extract_image_urls(&html, request.max_results);
        log::debug!("Page scrape '{}': {} image links", request.query, urls.len());
        urls.into_iter()
            .map(|url| ImageCandidate::new(url, Provider::HtmlScrape))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        assert!(Regex::new(PIN_IMAGE_PATTERN).is_ok());
        assert!(Regex::new(SIZE_SEGMENT_PATTERN).is_ok());
        assert!(SIZE_SEGMENT_RE.is_match("236x"));
        assert!(PIN_IMAGE_RE.is_match("https://i.pinimg.com/236x/a.jpg"));
    }

    #[test]
    fn size_segment_is_upscaled() {
        assert_eq!(
            upscale_url("https://i.pinimg.com/236x/ab/cd/ef/abcdef.jpg"),
            "https://i.pinimg.com/736x/ab/cd/ef/abcdef.jpg"
        );
        assert_eq!(
            upscale_url("https://i.pinimg.com/60x60/ab/cd.png"),
            "https://i.pinimg.com/736x/ab/cd.png"
        );
        assert_eq!(
            upscale_url("https://i.pinimg.com/originals/ab/cd.jpg"),
            "https://i.pinimg.com/originals/ab/cd.jpg"
        );
    }

    #[test]
    fn extracts_distinct_urls_in_page_order() {
        let html = r#"
            <img src="https://i.pinimg.com/236x/11/22/33/first.jpg">
            <img src="https://s.pinimg.com/webapp/logo.png">
            <img srcset="https://i.pinimg.com/474x/11/22/33/first.jpg 2x">
            <script>{"url":"https:\/\/i.pinimg.com\/236x\/44\/55\/second.webp"}</script>
            <a href="https://i.pinimg.com/236x/66/third.gif">gif</a>
            <img src="https://i.pinimg.com/236x/77/fourth.PNG">
        "#;
        let urls = extract_image_urls(html, 10);
        assert_eq!(
            urls,
            vec![
                "https://i.pinimg.com/736x/11/22/33/first.jpg",
                "https://i.pinimg.com/736x/44/55/second.webp",
                "https://i.pinimg.com/736x/77/fourth.PNG",
            ]
        );
    }

    #[test]
    fn extraction_respects_max() {
        let html = "https://i.pinimg.com/236x/a.jpg https://i.pinimg.com/236x/b.jpg";
        assert_eq!(extract_image_urls(html, 1).len(), 1);
        assert!(extract_image_urls("<html>nothing</html>", 5).is_empty());
    }
}
