//! Image source adapters, one per [`Provider`].
//!
//! Every adapter implements [`ImageSource`] and fails soft, so the
//! orchestrator can walk providers in policy order without error handling.

pub mod category_template;
pub mod html_scrape;
pub mod manual;
pub mod tag_search;

use std::path::PathBuf;

use shelfshot_core::{ImageSource, Provider};

use crate::client::{HttpConfig, Throttle, build_client};
use crate::credentials::ApiKey;
use crate::error::ScrapeError;

pub use category_template::CategoryTemplateSource;
pub use html_scrape::HtmlScrapeSource;
pub use manual::ManualSource;
pub use tag_search::TagSearchSource;

/// What adapter construction needs beyond the provider list.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub http: HttpConfig,
    /// Shared with the downloader so all external requests are spaced out.
    pub throttle: Throttle,
    /// `.env` file consulted for the tag-search key.
    pub env_file: PathBuf,
    /// CSV of `id,url` links for the manual provider.
    pub manual_links: Option<PathBuf>,
}

/// Build adapters for `providers`, in order.
///
/// Fails before any network traffic if a provider's prerequisites are
/// missing (API key, link list).
pub fn build_sources(
    providers: &[Provider],
    config: &SourceConfig,
) -> Result<Vec<Box<dyn ImageSource>>, ScrapeError> {
    let mut sources: Vec<Box<dyn ImageSource>> = Vec::with_capacity(providers.len());
    for provider in providers {
        let source: Box<dyn ImageSource> = match provider {
            Provider::TagSearch => {
                let key = ApiKey::load(&config.env_file)?;
                log::debug!("Tag-search key from {}", key.source());
                let http = build_client(&config.http, config.http.search_timeout)?;
                Box::new(TagSearchSource::new(http, key, config.throttle.clone()))
            }
            Provider::HtmlScrape => {
                let http = build_client(&config.http, config.http.search_timeout)?;
                Box::new(HtmlScrapeSource::new(http, config.throttle.clone()))
            }
            Provider::CategoryTemplate => Box::new(CategoryTemplateSource::new()),
            Provider::Manual => {
                let path = config.manual_links.as_ref().ok_or_else(|| {
                    ScrapeError::config("the manual provider needs a links CSV (--links)")
                })?;
                Box::new(ManualSource::from_csv(path)?)
            }
        };
        sources.push(source);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;

    fn config(dir: &std::path::Path) -> SourceConfig {
        SourceConfig {
            http: HttpConfig::default(),
            throttle: Throttle::new(std::time::Duration::ZERO),
            env_file: dir.join(".env"),
            manual_links: None,
        }
    }

    #[test]
    fn offline_providers_build_without_prerequisites() {
        let tmp = tempfile::tempdir().unwrap();
        let sources = build_sources(&[Provider::CategoryTemplate], &config(tmp.path())).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].provider(), Provider::CategoryTemplate);
    }

    #[test]
    fn manual_without_links_is_a_config_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build_sources(&[Provider::Manual], &config(tmp.path())).err().unwrap();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn provider_order_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let links = tmp.path().join("links.csv");
        std::fs::write(&links, "id,url\np1,https://x/1.jpg\n").unwrap();
        let mut cfg = config(tmp.path());
        cfg.manual_links = Some(links);
        let sources = build_sources(
            &[Provider::Manual, Provider::HtmlScrape, Provider::CategoryTemplate],
            &cfg,
        )
        .unwrap();
        let order: Vec<Provider> = sources.iter().map(|s| s.provider()).collect();
        assert_eq!(
            order,
            vec![Provider::Manual, Provider::HtmlScrape, Provider::CategoryTemplate]
        );
    }
}
