//! Mapping CSV audit trail: one row per processed entry, appended across
//! runs, plus the manual id -> link list.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One audit row. Column order is the CSV header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRow {
    pub id: String,
    /// The query used, or the provided link for manual runs.
    #[serde(alias = "provided_pin")]
    pub query: String,
    pub chosen_source: String,
    pub chosen_url: String,
    pub filename: String,
    pub sha256: String,
    pub notes: String,
}

impl MappingRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Appends rows to a mapping CSV, writing the header only when the file is
/// new or empty.
pub struct MappingWriter {
    writer: csv::Writer<File>,
    rows_written: usize,
}

impl MappingWriter {
    pub fn append(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    pub fn write(&mut self, row: &MappingRow) -> Result<(), CatalogError> {
        self.writer.serialize(row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn finish(mut self) -> Result<usize, CatalogError> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

/// Append a batch of rows and return how many were written.
pub fn append_rows(path: &Path, rows: &[MappingRow]) -> Result<usize, CatalogError> {
    let mut writer = MappingWriter::append(path)?;
    for row in rows {
        writer.write(row)?;
    }
    writer.finish()
}

/// Read every row of a mapping CSV. Missing columns default to empty.
pub fn read_rows(path: &Path) -> Result<Vec<MappingRow>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<MappingRow>() {
        let row = result?;
        if row.id.is_empty() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Merge several mapping CSVs by id.
///
/// A later row for an id replaces an earlier one (across and within files);
/// ids keep the position where they were first seen.
pub fn merge_files(paths: &[&Path]) -> Result<Vec<MappingRow>, CatalogError> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, MappingRow> = HashMap::new();

    for path in paths {
        let rows = read_rows(path)?;
        log::debug!("Read {} mapping rows from {}", rows.len(), path.display());
        for row in rows {
            if !latest.contains_key(&row.id) {
                order.push(row.id.clone());
            }
            latest.insert(row.id.clone(), row);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|id| latest.remove(&id))
        .collect())
}

/// Write rows to a fresh CSV, replacing any existing file.
pub fn write_rows(path: &Path, rows: &[MappingRow]) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    #[serde(default)]
    id: String,
    #[serde(default, alias = "provided_pin", alias = "link")]
    url: String,
}

/// Read a manual `id,url` (or `id,provided_pin`) list.
///
/// Rows without an id or a link are skipped; a later row for the same id
/// wins.
pub fn read_manual_links(path: &Path) -> Result<HashMap<String, String>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut links = HashMap::new();
    for result in reader.deserialize::<LinkRecord>() {
        let record = result?;
        if record.id.is_empty() || record.url.is_empty() {
            continue;
        }
        links.insert(record.id, record.url);
    }
    Ok(links)
}

#[cfg(test)]
#[path = "tests/mapping_tests.rs"]
mod tests;
