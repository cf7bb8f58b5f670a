/// Image providers the pipeline knows how to source from.
///
/// Centralizes provider identity (CLI names, display names, filename
/// prefixes) so adapters, the orchestrator and the audit trail agree on
/// naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Keyed JSON tag-search API (Pixabay-compatible).
    TagSearch,
    /// Search results page scraped for CDN image links (Pinterest-compatible).
    HtmlScrape,
    /// Fixed per-category stock URL lists (Unsplash links).
    CategoryTemplate,
    /// Operator-supplied id -> URL list.
    Manual,
}

/// All provider variants in default search order.
const ALL_PROVIDERS: &[Provider] = &[
    Provider::TagSearch,
    Provider::HtmlScrape,
    Provider::CategoryTemplate,
    Provider::Manual,
];

impl Provider {
    /// Canonical short name used for CLI flags, settings and CSV rows.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::TagSearch => "pixabay",
            Self::HtmlScrape => "pinterest",
            Self::CategoryTemplate => "unsplash",
            Self::Manual => "manual",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TagSearch => "Pixabay tag search",
            Self::HtmlScrape => "Pinterest search scrape",
            Self::CategoryTemplate => "Unsplash category template",
            Self::Manual => "Manual link",
        }
    }

    /// All accepted names, lowercase. The first entry is the short name.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::TagSearch => &["pixabay", "tag-search", "api"],
            Self::HtmlScrape => &["pinterest", "pin", "html", "scrape"],
            Self::CategoryTemplate => &["unsplash", "template", "stock"],
            Self::Manual => &["manual", "provided"],
        }
    }

    /// Filename prefix for randomized downloads from this provider.
    ///
    /// Prefixes encode provenance in the flat image directory.
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            Self::TagSearch => "ppp",
            Self::HtmlScrape => "pp_pin_",
            Self::CategoryTemplate => "pp_tpl_",
            Self::Manual => "pp_man_",
        }
    }

    /// Whether searching this provider needs network access.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::CategoryTemplate | Self::Manual)
    }

    /// All providers in default search order.
    pub fn all() -> &'static [Provider] {
        ALL_PROVIDERS
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Error returned when a string cannot be parsed into a `Provider`.
#[derive(Debug, Clone)]
pub struct ProviderParseError(pub String);

impl std::fmt::Display for ProviderParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown provider: '{}'", self.0)
    }
}

impl std::error::Error for ProviderParseError {}

impl std::str::FromStr for Provider {
    type Err = ProviderParseError;

    /// Parse a provider from any recognized name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ALL_PROVIDERS
            .iter()
            .copied()
            .find(|p| p.aliases().contains(&lower.as_str()))
            .ok_or_else(|| ProviderParseError(s.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
