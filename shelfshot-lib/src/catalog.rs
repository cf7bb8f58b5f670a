//! The catalog JSON file as a single persistence boundary.
//!
//! Jobs call [`CatalogStore::load`] once at start, work on the in-memory
//! [`Catalog`] snapshot, and call [`CatalogStore::save`] once at the end.
//! Nothing else in the workspace touches the catalog file directly.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use shelfshot_core::CatalogEntry;

use crate::error::CatalogError;

/// An in-memory snapshot of the catalog, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting empty or repeated ids.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CatalogError::invalid(format!("entry #{} has an empty id", i)));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::invalid(format!("duplicate id '{}'", entry.id)));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Point an entry at a new image. Returns false if the id is unknown.
    pub fn set_image_url(&mut self, id: &str, url: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.image_url = Some(url.into());
                true
            }
            None => false,
        }
    }

    /// Pretty-printed JSON (2-space indent) with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        let mut out = serde_json::to_string_pretty(&self.entries)?;
        out.push('\n');
        Ok(out)
    }

    /// Parse a catalog from JSON text (a top-level array of entries).
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_array() {
            return Err(CatalogError::invalid("top-level JSON value must be an array"));
        }
        let entries: Vec<CatalogEntry> = serde_json::from_value(value)?;
        Self::from_entries(entries)
    }
}

/// Reads and writes the catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the full catalog.
    pub fn load(&self) -> Result<Catalog, CatalogError> {
        if !self.exists() {
            return Err(CatalogError::NotFound(self.path.clone()));
        }
        let text = fs::read_to_string(&self.path)?;
        let catalog = Catalog::from_json(&text)?;
        log::debug!(
            "Loaded {} catalog entries from {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }

    /// Rewrite the full catalog.
    ///
    /// Writes to a sibling temp file and renames it over the catalog, so a
    /// crash mid-write leaves the previous content in place.
    pub fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let json = catalog.to_json_pretty()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!(
            "Wrote {} catalog entries to {}",
            catalog.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
