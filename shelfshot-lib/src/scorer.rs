//! Candidate scoring and selection.
//!
//! Scores are additive: entry tokens found among a candidate's tags, category
//! hint words found among its tags, and small bonuses for wide or popular
//! images. Ranking is a stable sort, so equal scores keep provider order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shelfshot_core::tokens::entry_tokens;
use shelfshot_core::{CatalogEntry, ImageCandidate};

use crate::dedup::UsedImages;

/// Tag words a strict dedup query insists on, so replacements stay product
/// shots rather than lifestyle photos.
pub const REQUIRED_KEYWORDS: &[&str] = &[
    "product",
    "packaging",
    "bottle",
    "label",
    "box",
    "package",
];

const DEFAULT_HINTS: &[&str] = &["product", "packaging"];

/// Hint words for a category key (lowercased). Unknown categories get the
/// generic product hints.
pub fn category_hints(category: Option<&str>) -> &'static [&'static str] {
    let Some(category) = category else {
        return DEFAULT_HINTS;
    };
    match category {
        c if c.contains("shampoo") || c.contains("conditioner") => {
            &["shampoo", "bottle", "hair", "packaging"]
        }
        c if c.contains("lotion") || c.contains("cream") => &["lotion", "cream", "bottle", "skincare"],
        c if c.contains("soap") => &["soap", "bar", "packaging"],
        c if c.contains("oil") => &["oil", "bottle", "cooking"],
        c if c.contains("perfume") || c.contains("fragrance") => &["perfume", "fragrance", "bottle"],
        c if c.contains("toothpaste") || c.contains("oral") => &["toothpaste", "tube", "dental"],
        c if c.contains("cereal") => &["cereal", "box", "breakfast"],
        c if c.contains("rice") || c.contains("flour") => &["rice", "flour", "bag", "grain"],
        c if c.contains("beverage") || c.contains("drink") || c.contains("juice") => {
            &["drink", "beverage", "bottle", "can"]
        }
        _ => DEFAULT_HINTS,
    }
}

/// Weights and thresholds for the additive score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per entry token found among the tags.
    pub tag_weight: i32,
    /// Per category hint word found among the tags.
    pub hint_weight: i32,
    pub wide_bonus: i32,
    pub wide_min_width: u32,
    pub popular_bonus: i32,
    pub popular_min_likes: u32,
    /// Scores below this are "no acceptable match".
    pub min_score: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            tag_weight: 1,
            hint_weight: 3,
            wide_bonus: 1,
            wide_min_width: 800,
            popular_bonus: 1,
            popular_min_likes: 50,
            min_score: 1,
        }
    }
}

/// How to treat a best score under `min_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Take the first eligible candidate anyway.
    #[default]
    Lenient,
    /// Take nothing.
    Strict,
}

impl SelectionMode {
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "loose" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown selection mode '{}' (expected lenient or strict)", other)),
        }
    }
}

/// A candidate together with its score for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: ImageCandidate,
    pub score: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Selector {
    pub weights: ScoreWeights,
    pub mode: SelectionMode,
    /// Require at least one of [`REQUIRED_KEYWORDS`] among the tags.
    pub require_keywords: bool,
}

impl Selector {
    pub fn new(weights: ScoreWeights, mode: SelectionMode) -> Self {
        Self {
            weights,
            mode,
            require_keywords: false,
        }
    }

    pub fn with_required_keywords(mut self, required: bool) -> Self {
        self.require_keywords = required;
        self
    }

    /// Score one candidate against pre-computed entry tokens and hints.
    pub fn score(&self, tokens: &[String], hints: &[&str], candidate: &ImageCandidate) -> i32 {
        let w = &self.weights;
        let has_tag = |word: &str| candidate.tags.iter().any(|t| t == word);

        let mut score = 0;
        score += w.tag_weight * tokens.iter().filter(|t| has_tag(t)).count() as i32;
        score += w.hint_weight * hints.iter().filter(|h| has_tag(h)).count() as i32;
        if candidate.width.is_some_and(|width| width >= w.wide_min_width) {
            score += w.wide_bonus;
        }
        if candidate.likes.is_some_and(|likes| likes >= w.popular_min_likes) {
            score += w.popular_bonus;
        }
        score
    }

    /// All candidates scored for `entry`, best first, ties in input order.
    pub fn rank(&self, entry: &CatalogEntry, candidates: &[ImageCandidate]) -> Vec<ScoredCandidate> {
        let tokens = entry_tokens(entry);
        let category = entry.category_key();
        let hints = category_hints(category.as_deref());

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|c| ScoredCandidate {
                score: self.score(&tokens, hints, c),
                candidate: c.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    fn eligible(&self, candidate: &ImageCandidate, used: &UsedImages) -> bool {
        if used.has_url(&candidate.url) {
            return false;
        }
        if self.require_keywords {
            return candidate
                .tags
                .iter()
                .any(|t| REQUIRED_KEYWORDS.contains(&t.as_str()));
        }
        true
    }

    /// Candidates to try in order, so the caller can fall through to the
    /// next one after a failed or duplicate download.
    ///
    /// Used URLs (and, when required, keyword-less candidates) are dropped.
    /// Candidates meeting `min_score` come first by rank. In lenient mode
    /// the remaining candidates follow in provider order.
    pub fn shortlist(
        &self,
        entry: &CatalogEntry,
        candidates: &[ImageCandidate],
        used: &UsedImages,
    ) -> Vec<ScoredCandidate> {
        let ranked: Vec<ScoredCandidate> = self
            .rank(entry, candidates)
            .into_iter()
            .filter(|s| self.eligible(&s.candidate, used))
            .collect();

        let min = self.weights.min_score;
        let mut list: Vec<ScoredCandidate> =
            ranked.iter().filter(|s| s.score >= min).cloned().collect();

        if self.mode == SelectionMode::Lenient {
            // Below-threshold fallbacks in the order the provider returned them
            for c in candidates {
                if list.iter().any(|s| s.candidate.url == c.url) {
                    continue;
                }
                if let Some(s) = ranked.iter().find(|s| s.candidate.url == c.url) {
                    list.push(s.clone());
                }
            }
        }
        list
    }

    /// The single best pick, if any.
    pub fn select(
        &self,
        entry: &CatalogEntry,
        candidates: &[ImageCandidate],
        used: &UsedImages,
    ) -> Option<ScoredCandidate> {
        self.shortlist(entry, candidates, used).into_iter().next()
    }
}

#[cfg(test)]
#[path = "tests/scorer_tests.rs"]
mod tests;
