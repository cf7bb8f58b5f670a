//! Backups taken before a job mutates the catalog or replaces an image.
//!
//! Backups are append-only: an existing backup is never overwritten, a
//! timestamp (and if needed a counter) is added instead.

use std::fs;
use std::path::{Path, PathBuf};

/// Where a catalog backup goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupTarget {
    /// Next to the catalog as `<catalog>.<suffix>`, e.g. `products.json.remap.bak`.
    Suffix(String),
    /// Into a directory as `<stem>-<YYYYmmdd-HHMMSS>.<ext>`.
    Timestamped { dir: PathBuf },
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Return `candidate` if free, else the first free `<stem>-<n>.<ext>` variant.
fn first_free(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }
    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = candidate
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = match name.split_once('.') {
        Some((s, e)) => (s.to_string(), format!(".{}", e)),
        None => (name.clone(), String::new()),
    };
    (1..)
        .map(|n| parent.join(format!("{}-{}{}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Path a suffix backup of `catalog` would use, ignoring collisions.
pub fn suffix_path(catalog: &Path, suffix: &str) -> PathBuf {
    let name = catalog
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog.json".to_string());
    catalog.with_file_name(format!("{}.{}", name, suffix.trim_start_matches('.')))
}

/// Copy the catalog to its backup location and return the backup path.
pub fn backup_catalog(catalog: &Path, target: &BackupTarget) -> std::io::Result<PathBuf> {
    let dest = match target {
        BackupTarget::Suffix(suffix) => {
            let plain = suffix_path(catalog, suffix);
            if plain.exists() {
                let stamped = suffix_path(
                    catalog,
                    &format!("{}.{}", timestamp(), suffix.trim_start_matches('.')),
                );
                first_free(stamped)
            } else {
                plain
            }
        }
        BackupTarget::Timestamped { dir } => {
            fs::create_dir_all(dir)?;
            let stem = catalog
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "catalog".to_string());
            let ext = catalog
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "json".to_string());
            first_free(dir.join(format!("{}-{}.{}", stem, timestamp(), ext)))
        }
    };
    fs::copy(catalog, &dest)?;
    log::info!("Backed up catalog to {}", dest.display());
    Ok(dest)
}

/// Copy an image that is about to be superseded into `backup_dir`.
///
/// The original stays in place; the copy is named `<file>.<stamp>.bak`.
pub fn backup_image(image: &Path, backup_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(backup_dir)?;
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dest = first_free(backup_dir.join(format!("{}.{}.bak", name, timestamp())));
    fs::copy(image, &dest)?;
    log::debug!("Backed up image {} to {}", image.display(), dest.display());
    Ok(dest)
}
