//! Content-hash index over the image directory and duplicate detection
//! across catalog entries.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use shelfshot_core::CatalogEntry;
use shelfshot_core::util::{has_image_extension, is_placeholder_filename, local_filename};

use crate::hasher::sha256_file;

/// `filename -> digest` and `digest -> [filename]` over one flat image
/// directory.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    by_file: HashMap<String, String>,
    by_digest: HashMap<String, Vec<String>>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash every image file in `dir` (non-recursive).
    ///
    /// Unreadable files are skipped with a warning. A missing directory
    /// yields an empty index.
    pub fn scan_dir(dir: &Path) -> std::io::Result<Self> {
        let mut index = Self::new();
        if !dir.is_dir() {
            return Ok(index);
        }

        let mut names: Vec<String> = fs::read_dir(dir)?
            .flatten()
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|n| has_image_extension(n))
            .collect();
        names.sort();

        for name in names {
            match sha256_file(&dir.join(&name)) {
                Ok(digest) => index.insert(&name, &digest),
                Err(e) => log::warn!("Could not hash {}: {}", name, e),
            }
        }
        log::debug!(
            "Indexed {} images ({} distinct) in {}",
            index.len(),
            index.digest_count(),
            dir.display()
        );
        Ok(index)
    }

    /// Record a file's digest, replacing any previous digest for that file.
    pub fn insert(&mut self, filename: &str, digest: &str) {
        self.remove_file(filename);
        self.by_file.insert(filename.to_string(), digest.to_string());
        self.by_digest
            .entry(digest.to_string())
            .or_default()
            .push(filename.to_string());
    }

    pub fn remove_file(&mut self, filename: &str) {
        if let Some(old) = self.by_file.remove(filename) {
            if let Some(files) = self.by_digest.get_mut(&old) {
                files.retain(|f| f != filename);
                if files.is_empty() {
                    self.by_digest.remove(&old);
                }
            }
        }
    }

    pub fn digest_of(&self, filename: &str) -> Option<&str> {
        self.by_file.get(filename).map(String::as_str)
    }

    pub fn files_for(&self, digest: &str) -> &[String] {
        self.by_digest.get(digest).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_digest(&self, digest: &str) -> bool {
        self.by_digest.contains_key(digest)
    }

    /// Whether `digest` is held by any file other than `own_file`.
    pub fn is_taken(&self, digest: &str, own_file: Option<&str>) -> bool {
        self.files_for(digest)
            .iter()
            .any(|f| Some(f.as_str()) != own_file)
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }

    /// Number of distinct digests.
    pub fn digest_count(&self) -> usize {
        self.by_digest.len()
    }
}

/// External URLs and content digests already claimed during one run.
///
/// Passed into and returned from each job so repeated invocations (and
/// tests) stay isolated; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedImages {
    urls: HashSet<String>,
    digests: HashSet<String>,
}

impl UsedImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_url(&mut self, url: &str) {
        self.urls.insert(url.to_string());
    }

    pub fn mark_digest(&mut self, digest: &str) {
        self.digests.insert(digest.to_string());
    }

    pub fn has_url(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn has_digest(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }

    pub fn url_count(&self) -> usize {
        self.urls.len()
    }

    pub fn digest_count(&self) -> usize {
        self.digests.len()
    }
}

/// Entries whose local image files share one digest, in catalog order.
///
/// Only built by [`duplicate_groups`], so there are always at least two
/// entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    digest: String,
    entry_ids: Vec<String>,
}

impl DuplicateGroup {
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Short digest prefix for log lines.
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }

    /// Every sharer, keeper first.
    pub fn entry_ids(&self) -> &[String] {
        &self.entry_ids
    }

    /// The entry that keeps its image.
    pub fn keeper(&self) -> &str {
        self.entry_ids.first().map(String::as_str).unwrap_or_default()
    }

    /// Entries that need a replacement image.
    pub fn others(&self) -> &[String] {
        self.entry_ids.get(1..).unwrap_or_default()
    }
}

/// Group entries by the digest of the local file their `image_url` names.
///
/// Placeholders and entries whose file is missing from the index are left
/// out. Groups are ordered by the catalog position of their first member.
pub fn duplicate_groups(
    entries: &[CatalogEntry],
    index: &DedupIndex,
    public_prefix: &str,
) -> Vec<DuplicateGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<String>> = HashMap::new();

    for entry in entries {
        let Some(filename) = entry
            .current_image()
            .and_then(|url| local_filename(url, public_prefix))
        else {
            continue;
        };
        if is_placeholder_filename(filename) {
            continue;
        }
        let Some(digest) = index.digest_of(filename) else {
            continue;
        };
        let ids = members.entry(digest.to_string()).or_default();
        if ids.is_empty() {
            order.push(digest.to_string());
        }
        ids.push(entry.id.clone());
    }

    order
        .into_iter()
        .filter_map(|digest| {
            let entry_ids = members.remove(&digest)?;
            (entry_ids.len() > 1).then_some(DuplicateGroup { digest, entry_ids })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/dedup_tests.rs"]
mod tests;
