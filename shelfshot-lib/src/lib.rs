//! Local building blocks for the image pipeline: the catalog store and its
//! backups, content hashing and the dedup index, candidate scoring,
//! placeholders, the mapping CSV, the review gallery and settings.

pub mod async_util;
pub mod backup;
pub mod catalog;
pub mod dedup;
pub mod error;
pub mod gallery;
pub mod hasher;
pub mod mapping;
pub mod placeholder;
pub mod scorer;
pub mod settings;

pub use backup::BackupTarget;
pub use catalog::{Catalog, CatalogStore};
pub use dedup::{DedupIndex, DuplicateGroup, UsedImages};
pub use error::CatalogError;
pub use mapping::MappingRow;
pub use scorer::{ScoreWeights, ScoredCandidate, SelectionMode, Selector};
pub use settings::Settings;
