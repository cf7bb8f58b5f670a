//! Run policies: which entries a job touches, where it looks, how it names
//! files and what it does when nothing fits.
//!
//! Every job mode is a [`Preset`] expanding to a [`RunPolicy`]; CLI flags
//! then adjust individual fields.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use shelfshot_core::{CatalogEntry, Provider};
use shelfshot_lib::SelectionMode;

use crate::download::FilenameStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Re-map every entry through the tag-search API.
    Remap,
    /// Only entries without a usable local image.
    FillMissing,
    /// Search page scrape.
    Pinterest,
    /// Category stock photos, no network search.
    Stock,
    /// Apply an operator-supplied link list.
    Manual,
    /// Replace images shared by several entries.
    Dedup,
}

const ALL_PRESETS: &[Preset] = &[
    Preset::Remap,
    Preset::FillMissing,
    Preset::Pinterest,
    Preset::Stock,
    Preset::Manual,
    Preset::Dedup,
];

impl Preset {
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Remap => "remap",
            Self::FillMissing => "fill-missing",
            Self::Pinterest => "pinterest",
            Self::Stock => "stock",
            Self::Manual => "manual",
            Self::Dedup => "dedup",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Remap => "re-map every entry through the tag-search API",
            Self::FillMissing => "fill entries with missing, external or placeholder images",
            Self::Pinterest => "source images from the search page scrape",
            Self::Stock => "assign category stock photos",
            Self::Manual => "apply a CSV of provided image links",
            Self::Dedup => "replace images shared by more than one entry",
        }
    }

    pub fn all() -> &'static [Preset] {
        ALL_PRESETS
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase().replace('_', "-");
        ALL_PRESETS
            .iter()
            .copied()
            .find(|p| p.short_name() == lower || (lower == "missing" && *p == Self::FillMissing))
            .ok_or_else(|| {
                let names: Vec<&str> = ALL_PRESETS.iter().map(|p| p.short_name()).collect();
                format!("unknown preset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Split an id into its text and trailing-number parts for natural
/// ordering: `p9 < p10 < p100`.
fn natural_key(id: &str) -> (&str, Option<u64>) {
    let digits = id.len() - id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (head, tail) = id.split_at(id.len() - digits);
    (head, tail.parse().ok())
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ha, na) = natural_key(a);
    let (hb, nb) = natural_key(b);
    ha.cmp(hb).then(na.cmp(&nb)).then(a.cmp(b))
}

/// Inclusive id range, `p001..p050`, compared in natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRange {
    pub from: String,
    pub to: String,
}

impl IdRange {
    pub fn contains(&self, id: &str) -> bool {
        natural_cmp(id, &self.from) != Ordering::Less && natural_cmp(id, &self.to) != Ordering::Greater
    }
}

impl FromStr for IdRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (from, to) = s
            .split_once("..")
            .ok_or_else(|| format!("invalid range '{}' (expected FROM..TO)", s))?;
        let (from, to) = (from.trim(), to.trim().trim_start_matches('='));
        if from.is_empty() || to.is_empty() {
            return Err(format!("invalid range '{}' (expected FROM..TO)", s));
        }
        if natural_cmp(from, to) == Ordering::Greater {
            return Err(format!("range start '{}' is after its end '{}'", from, to));
        }
        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Batch restrictions, combinable with any preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Case-insensitive category match.
    pub category: Option<String>,
    pub id_range: Option<IdRange>,
    /// Only these ids (e.g. the ids a manual link list covers).
    pub only_ids: Option<HashSet<String>>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(wanted) = &self.category {
            let wanted = wanted.trim().to_lowercase();
            if entry.category_key().as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(range) = &self.id_range {
            if !range.contains(&entry.id) {
                return false;
            }
        }
        if let Some(ids) = &self.only_ids {
            if !ids.contains(&entry.id) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.id_range.is_none() && self.only_ids.is_none()
    }
}

/// Everything that varies between job modes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPolicy {
    pub preset: Preset,
    /// Sources to try, in order.
    pub providers: Vec<Provider>,
    pub selection: SelectionMode,
    /// Overrides the configured `min_score`.
    pub min_score: Option<i32>,
    /// Require a product-ish tag (product, packaging, bottle, ...).
    pub require_keywords: bool,
    /// With no acceptable candidate, keep a current non-placeholder image
    /// instead of writing a placeholder.
    pub keep_existing_on_no_match: bool,
    /// Reject downloads whose content already backs another entry.
    pub dedup: bool,
    /// Process at most this many matching entries.
    pub sample: Option<usize>,
    /// Re-process entries that already have a local image.
    pub force: bool,
    pub filter: EntryFilter,
    pub filename_style: FilenameStyle,
    /// `Some(suffix)` backs up to `<catalog>.<suffix>`, `None` to a
    /// timestamped copy under the artifacts directory.
    pub backup_suffix: Option<String>,
    /// Mapping CSV file name under the artifacts directory.
    pub mapping_csv: String,
    /// Candidates requested per query.
    pub max_results: usize,
    /// Tries per query when it returns nothing (the retry waits longer).
    pub attempts_per_query: usize,
    /// Count entries resolved by keeping their current image as changed.
    pub count_kept_as_changed: bool,
}

impl RunPolicy {
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            preset,
            providers: vec![Provider::TagSearch],
            selection: SelectionMode::Lenient,
            min_score: None,
            require_keywords: false,
            keep_existing_on_no_match: false,
            dedup: true,
            sample: None,
            force: false,
            filter: EntryFilter::default(),
            filename_style: FilenameStyle::Deterministic,
            backup_suffix: None,
            mapping_csv: format!("{}_mapping.csv", preset.short_name().replace('-', "_")),
            max_results: 20,
            attempts_per_query: 2,
            count_kept_as_changed: false,
        };

        match preset {
            Preset::Remap => Self {
                force: true,
                keep_existing_on_no_match: true,
                filename_style: FilenameStyle::Randomized,
                backup_suffix: Some("remap.bak".into()),
                ..base
            },
            Preset::FillMissing => Self {
                providers: vec![Provider::TagSearch, Provider::CategoryTemplate],
                ..base
            },
            Preset::Pinterest => Self {
                providers: vec![Provider::HtmlScrape],
                force: true,
                keep_existing_on_no_match: true,
                filename_style: FilenameStyle::Randomized,
                backup_suffix: Some("pinterest.bak".into()),
                max_results: 25,
                ..base
            },
            Preset::Stock => Self {
                providers: vec![Provider::CategoryTemplate],
                attempts_per_query: 1,
                ..base
            },
            Preset::Manual => Self {
                providers: vec![Provider::Manual],
                force: true,
                keep_existing_on_no_match: true,
                filename_style: FilenameStyle::Randomized,
                backup_suffix: Some("manual-pinterest.bak".into()),
                max_results: 1,
                attempts_per_query: 1,
                ..base
            },
            Preset::Dedup => Self {
                selection: SelectionMode::Strict,
                require_keywords: true,
                filename_style: FilenameStyle::Randomized,
                backup_suffix: Some("dedup.bak".into()),
                ..base
            },
        }
    }

    pub fn uses_network(&self) -> bool {
        self.providers.iter().any(Provider::is_remote)
    }

    /// Queries issued for an entry, most specific first. Strict selection
    /// adds a product-packaging query.
    pub fn queries_for(&self, entry: &CatalogEntry) -> Vec<String> {
        build_queries(entry, self.selection == SelectionMode::Strict)
    }
}

/// Search queries for an entry: brand + name + category, name + category,
/// then category + "product". Empty parts are skipped and duplicates
/// dropped; an entry with no text at all falls back to its id.
pub fn build_queries(entry: &CatalogEntry, strict: bool) -> Vec<String> {
    let part = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").to_string();
    let (brand, name, category) = (part(&entry.brand), part(&entry.name), part(&entry.category));

    fn join(parts: &[&str]) -> String {
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    let mut candidates = vec![
        join(&[brand.as_str(), name.as_str(), category.as_str()]),
        join(&[name.as_str(), category.as_str()]),
    ];
    if !category.is_empty() {
        candidates.push(join(&[category.as_str(), "product"]));
    }
    if strict {
        let subject = if name.is_empty() { &category } else { &name };
        if !subject.is_empty() {
            candidates.push(join(&[subject.as_str(), "product packaging"]));
        }
    }

    let mut queries: Vec<String> = Vec::new();
    for q in candidates {
        if !q.is_empty() && !queries.contains(&q) {
            queries.push(q);
        }
    }
    if queries.is_empty() {
        queries.push(entry.id.clone());
    }
    queries
}

#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod tests;
