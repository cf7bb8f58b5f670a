use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod provider;
pub mod tokens;
pub mod util;

pub use provider::{Provider, ProviderParseError};

/// One product record in the storefront catalog.
///
/// The pipeline reads `name`, `brand` and `category` and owns `image_url`.
/// Every other field is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct CatalogEntry {
    /// Stable identifier, unique within the catalog. Numeric ids in the
    /// source JSON are read as their decimal string.
    pub id: String,

    /// The id as a JSON number, when it was one in the source. Saving
    /// writes it back as that number.
    pub numeric_id: Option<serde_json::Number>,

    pub name: Option<String>,

    pub brand: Option<String>,

    pub category: Option<String>,

    /// Local `/images/products/<file>` path, or transiently an external URL.
    pub image_url: Option<String>,

    /// Fields owned by other processes (price, stock, description, ...).
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// On-disk shape of a catalog entry, with the id as it appears in JSON.
#[derive(Serialize, Deserialize)]
struct RawEntry {
    id: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    brand: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,

    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawEntry> for CatalogEntry {
    type Error = String;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let (id, numeric_id) = match raw.id {
            serde_json::Value::String(s) => (s, None),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => (n.to_string(), Some(n)),
            other => return Err(format!("id must be a string or an integer, got {}", other)),
        };
        Ok(Self {
            id,
            numeric_id,
            name: raw.name,
            brand: raw.brand,
            category: raw.category,
            image_url: raw.image_url,
            extra: raw.extra,
        })
    }
}

impl From<CatalogEntry> for RawEntry {
    fn from(entry: CatalogEntry) -> Self {
        let id = match entry.numeric_id {
            Some(n) if n.to_string() == entry.id => serde_json::Value::Number(n),
            _ => serde_json::Value::String(entry.id),
        };
        Self {
            id,
            name: entry.name,
            brand: entry.brand,
            category: entry.category,
            image_url: entry.image_url,
            extra: entry.extra,
        }
    }
}

impl CatalogEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            numeric_id: None,
            name: None,
            brand: None,
            category: None,
            image_url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Name for display and placeholder text, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    /// The current `image_url`, treating an empty string as unset.
    pub fn current_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Lowercased, trimmed category, if any.
    pub fn category_key(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }
}

/// An image URL returned by a source, plus whatever metadata the provider
/// exposes for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub provider: Provider,
    /// Lowercased tag words (empty when the provider has none).
    pub tags: Vec<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Popularity signal (likes, saves).
    pub likes: Option<u32>,
}

impl ImageCandidate {
    pub fn new(url: impl Into<String>, provider: Provider) -> Self {
        Self {
            url: url.into(),
            provider,
            tags: Vec::new(),
            width: None,
            height: None,
            likes: None,
        }
    }

    /// Attach tags from a free-text tag string ("shampoo, bottle, hair care").
    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = tokens::tokenize(tags);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_likes(mut self, likes: u32) -> Self {
        self.likes = Some(likes);
        self
    }
}

/// One search issued against a source on behalf of a catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub entry: &'a CatalogEntry,
    pub max_results: usize,
}

/// A provider of candidate images.
///
/// Implementations fail soft: network errors, timeouts, non-success
/// statuses and unparseable bodies yield an empty list, never an error,
/// so the caller can move on to the next query or provider.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// The provider this source queries.
    fn provider(&self) -> Provider;

    /// Return up to `request.max_results` candidates, best-effort.
    async fn search(&self, request: &SearchRequest<'_>) -> Vec<ImageCandidate>;
}

/// Per-entry processing state, in the order the orchestrator moves through
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    Pending,
    Searching,
    CandidateFound,
    NoCandidate,
    Downloading,
    Accepted,
    DuplicateRejected,
    DownloadFailed,
    Resolved,
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Searching => "searching",
            Self::CandidateFound => "candidate found",
            Self::NoCandidate => "no candidate",
            Self::Downloading => "downloading",
            Self::Accepted => "accepted",
            Self::DuplicateRejected => "duplicate rejected",
            Self::DownloadFailed => "download failed",
            Self::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_unknown_fields() {
        let json = r#"{"id":"p1","name":"Soap","price":3.5,"tags":["a"],"image_url":null}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, "p1");
        assert_eq!(entry.extra.get("price"), Some(&serde_json::json!(3.5)));
        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["tags"], serde_json::json!(["a"]));
        assert_eq!(out["name"], "Soap");
    }

    #[test]
    fn numeric_ids_are_keyed_by_string_and_written_back_as_numbers() {
        let entry: CatalogEntry = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(entry.id, "42");
        assert_eq!(serde_json::to_value(&entry).unwrap()["id"], serde_json::json!(42));

        let text: CatalogEntry = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(text.id, "42");
        assert_eq!(serde_json::to_value(&text).unwrap()["id"], serde_json::json!("42"));
    }

    #[test]
    fn non_integer_ids_are_rejected() {
        for json in [r#"{"id": 1.5}"#, r#"{"id": null}"#, r#"{"id": [1]}"#] {
            assert!(serde_json::from_str::<CatalogEntry>(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn missing_id_is_an_error() {
        let result: Result<CatalogEntry, _> = serde_json::from_str(r#"{"name": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let mut entry = CatalogEntry::new("p9");
        assert_eq!(entry.display_name(), "p9");
        entry.name = Some("  ".into());
        assert_eq!(entry.display_name(), "p9");
        entry.name = Some("Body Lotion".into());
        assert_eq!(entry.display_name(), "Body Lotion");
    }

    #[test]
    fn empty_image_url_counts_as_unset() {
        let mut entry = CatalogEntry::new("p1");
        entry.image_url = Some("   ".into());
        assert_eq!(entry.current_image(), None);
    }

    #[test]
    fn candidate_tags_are_tokenized() {
        let c = ImageCandidate::new("https://x/y.jpg", Provider::TagSearch)
            .with_tags("Shampoo, bottle, hair care");
        assert_eq!(c.tags, vec!["shampoo", "bottle", "hair", "care"]);
    }
}
