//! Operator-supplied id -> image link list.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use shelfshot_core::{ImageCandidate, ImageSource, Provider, SearchRequest};
use shelfshot_lib::mapping::read_manual_links;

use crate::error::ScrapeError;

#[derive(Debug, Clone, Default)]
pub struct ManualSource {
    links: HashMap<String, String>,
}

impl ManualSource {
    pub fn new(links: HashMap<String, String>) -> Self {
        Self { links }
    }

    /// Load links from an `id,url` / `id,provided_pin` CSV.
    pub fn from_csv(path: &Path) -> Result<Self, ScrapeError> {
        let links = read_manual_links(path)?;
        log::info!("Loaded {} manual links from {}", links.len(), path.display());
        Ok(Self { links })
    }

    pub fn link_for(&self, id: &str) -> Option<&str> {
        self.links.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl ImageSource for ManualSource {
    fn provider(&self) -> Provider {
        Provider::Manual
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
        self.link_for(&request.entry.id)
            .map(|url| vec![ImageCandidate::new(url, Provider::Manual)])
            .unwrap_or_default()
    }
}
