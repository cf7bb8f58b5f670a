//! Keyed JSON tag-search API (Pixabay-compatible).

use async_trait::async_trait;
use serde::Deserialize;
use shelfshot_core::{CatalogEntry, ImageCandidate, ImageSource, Provider, SearchRequest};

use crate::client::Throttle;
use crate::credentials::ApiKey;

pub const DEFAULT_ENDPOINT: &str = "https://pixabay.com/api/";

/// The API rejects `per_page` outside this range.
const PER_PAGE_MIN: usize = 3;
const PER_PAGE_MAX: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hit {
    #[serde(rename = "largeImageURL")]
    large_image_url: Option<String>,
    #[serde(rename = "webformatURL")]
    webformat_url: Option<String>,
    #[serde(default)]
    tags: String,
    image_width: Option<u32>,
    image_height: Option<u32>,
    likes: Option<u32>,
}

/// Map hits from a response body to candidates, keeping at most `max`.
///
/// Hits without any image URL are dropped.
pub fn parse_hits(body: &str, max: usize) -> Result<Vec<ImageCandidate>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let candidates = response
        .hits
        .into_iter()
        .filter_map(|hit| {
            let url = hit
                .large_image_url
                .filter(|u| !u.is_empty())
                .or(hit.webformat_url.filter(|u| !u.is_empty()))?;
            let mut candidate = ImageCandidate::new(url, Provider::TagSearch).with_tags(&hit.tags);
            candidate.width = hit.image_width;
            candidate.height = hit.image_height;
            candidate.likes = hit.likes;
            Some(candidate)
        })
        .take(max)
        .collect();
    Ok(candidates)
}

/// The API's own category for an entry, when one fits.
pub fn api_category(entry: &CatalogEntry) -> Option<&'static str> {
    let category = entry.category_key()?;
    let food = ["oil", "cereal", "rice", "flour", "beverage", "drink", "juice", "food", "snack"];
    let health = ["shampoo", "lotion", "soap", "perfume", "toothpaste", "cream", "beauty"];
    if food.iter().any(|w| category.contains(w)) {
        Some("food")
    } else if health.iter().any(|w| category.contains(w)) {
        Some("health")
    } else {
        None
    }
}

/// Query parameters for one search.
pub fn query_params(key: &str, request: &SearchRequest<'_>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("key", key.to_string()),
        ("q", request.query.to_string()),
        ("image_type", "photo".to_string()),
        ("safesearch", "true".to_string()),
        (
            "per_page",
            request.max_results.clamp(PER_PAGE_MIN, PER_PAGE_MAX).to_string(),
        ),
    ];
    if let Some(category) = api_category(request.entry) {
        params.push(("category", category.to_string()));
    }
    params
}

pub struct TagSearchSource {
    http: reqwest::Client,
    key: ApiKey,
    endpoint: String,
    throttle: Throttle,
}

impl TagSearchSource {
    pub fn new(http: reqwest::Client, key: ApiKey, throttle: Throttle) -> Self {
        Self {
            http,
            key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            throttle,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl ImageSource for TagSearchSource {
    fn provider(&self) -> Provider {
        Provider::TagSearch
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
        self.throttle.wait().await;

        let params = query_params(self.key.expose(), request);
        let resp = match self.http.get(&self.endpoint).query(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Tag search failed for '{}': {}", request.query, e);
                return Vec::new();
            }
        };

        let status = resp.status();
        if !status.is_success() {
            log::warn!("Tag search returned HTTP {} for '{}'", status.as_u16(), request.query);
            return Vec::new();
        }

        let body = match resp.text().await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Tag search body unreadable for '{}': {}", request.query, e);
                return Vec::new();
            }
        };

        match parse_hits(&body, request.max_results) {
            Ok(candidates) => {
                log::debug!("Tag search '{}': {} candidates", request.query, candidates.len());
                candidates
            }
            Err(e) => {
                log::debug!(
                    "Tag search response for '{}' did not parse: {}. Response: {}",
                    request.query,
                    e,
                    body.chars().take(200).collect::<String>()
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "total": 3, "totalHits": 3,
        "hits": [
            {"largeImageURL": "https://pixabay.com/get/a_1280.jpg", "webformatURL": "https://pixabay.com/get/a_640.jpg",
             "tags": "shampoo, bottle, hair care", "imageWidth": 4000, "imageHeight": 3000, "likes": 61},
            {"webformatURL": "https://pixabay.com/get/b_640.jpg", "tags": "soap", "imageWidth": 640},
            {"tags": "no url at all"}
        ]
    }"#;

    #[test]
    fn hits_map_to_candidates() {
        let candidates = parse_hits(BODY, 10).unwrap();
        assert_eq!(candidates.len(), 2);
        let first = &candidates[0];
        assert_eq!(first.url, "https://pixabay.com/get/a_1280.jpg");
        assert_eq!(first.tags, vec!["shampoo", "bottle", "hair", "care"]);
        assert_eq!((first.width, first.height, first.likes), (Some(4000), Some(3000), Some(61)));
        assert_eq!(candidates[1].url, "https://pixabay.com/get/b_640.jpg");
        assert_eq!(candidates[1].provider, Provider::TagSearch);
    }

    #[test]
    fn results_are_truncated() {
        assert_eq!(parse_hits(BODY, 1).unwrap().len(), 1);
    }

    #[test]
    fn missing_hits_is_empty_and_garbage_is_error() {
        assert!(parse_hits(r#"{"total":0}"#, 5).unwrap().is_empty());
        assert!(parse_hits("<html>rate limited</html>", 5).is_err());
    }

    #[test]
    fn per_page_is_clamped() {
        let entry = CatalogEntry::new("p1");
        let param = |max| {
            let request = SearchRequest { query: "soap", entry: &entry, max_results: max };
            query_params("k", &request)
                .into_iter()
                .find(|(k, _)| *k == "per_page")
                .map(|(_, v)| v)
                .unwrap()
        };
        assert_eq!(param(1), "3");
        assert_eq!(param(20), "20");
        assert_eq!(param(500), "200");
    }

    #[test]
    fn category_param_only_when_known() {
        let shampoo = CatalogEntry {
            category: Some("Shampoo".into()),
            ..CatalogEntry::new("p1")
        };
        let request = SearchRequest { query: "x", entry: &shampoo, max_results: 5 };
        let params = query_params("k", &request);
        assert!(params.contains(&("category", "health".to_string())));
        assert!(params.contains(&("safesearch", "true".to_string())));

        let other = CatalogEntry {
            category: Some("garden".into()),
            ..CatalogEntry::new("p2")
        };
        let request = SearchRequest { query: "x", entry: &other, max_results: 5 };
        assert!(!query_params("k", &request).iter().any(|(k, _)| *k == "category"));
    }
}
