use sha2::{Digest, Sha256};

/// File extensions recognised as catalog images (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "svg", "gif"];

/// Filename prefix for synthesized placeholders.
pub const PLACEHOLDER_PREFIX: &str = "pp_placeholder_";

/// Format a byte count with fractional KB/MB (e.g., "1.5 KB", "2.3 MB").
pub fn format_bytes_approx(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Whether a filename carries one of the catalog image extensions.
pub fn has_image_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether a filename was produced by the placeholder generator.
pub fn is_placeholder_filename(filename: &str) -> bool {
    filename.starts_with(PLACEHOLDER_PREFIX)
}

/// Whether an `image_url` points at a remote resource rather than the
/// local image directory.
pub fn is_external_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Extract the local filename from an `image_url` under `public_prefix`.
///
/// `/images/products/abc.jpg?v=123` with prefix `/images/products` yields
/// `abc.jpg`. Returns `None` for external URLs, other prefixes, nested
/// paths, or empty names.
pub fn local_filename<'a>(image_url: &'a str, public_prefix: &str) -> Option<&'a str> {
    if is_external_url(image_url) {
        return None;
    }
    let path = image_url.split(['?', '#']).next().unwrap_or("");
    let prefix = public_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?.strip_prefix('/')?;
    if rest.is_empty() || rest.contains('/') {
        None
    } else {
        Some(rest)
    }
}

/// Build the public `image_url` for a file in the image directory.
pub fn public_url(public_prefix: &str, filename: &str, cache_bust: Option<&str>) -> String {
    let prefix = public_prefix.trim_end_matches('/');
    match cache_bust {
        Some(stamp) => format!("{}/{}?v={}", prefix, filename, stamp),
        None => format!("{}/{}", prefix, filename),
    }
}

/// Make an entry id safe to embed in a filename.
///
/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "entry".to_string()
    } else {
        cleaned
    }
}

/// Filename stem for an entry id.
///
/// Ids that are already filename safe are used as-is. Any id that
/// [`sanitize_id`] had to change gets a short hash of the raw id appended,
/// so `p 1` and `p_1` never share a file.
pub fn id_file_stem(id: &str) -> String {
    let clean = sanitize_id(id);
    if clean == id {
        clean
    } else {
        format!("{}_{}", clean, &sha256_hex(id.as_bytes())[..8])
    }
}

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Deterministic index in `0..len` derived from `key`.
///
/// Uses the first eight bytes of the key's SHA-256, so the mapping is
/// stable across builds and platforms. Returns 0 for an empty range.
pub fn stable_index(key: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let digest = Sha256::digest(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % len as u64) as usize
}

#[cfg(test)]
#[path = "tests/util_tests.rs"]
mod tests;
