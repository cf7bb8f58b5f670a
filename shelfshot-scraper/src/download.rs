//! Fetching chosen images and persisting them into the image directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use shelfshot_core::Provider;
use shelfshot_core::util::id_file_stem;

use crate::client::{HttpConfig, Throttle, build_client};
use crate::error::ScrapeError;

/// A downloaded payload, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// URL after redirects.
    pub final_url: String,
}

/// Downloads image bytes. Behind a trait so jobs can run against canned
/// payloads.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ScrapeError>;
}

/// [`Fetcher`] over HTTP with the download timeout and redirect limit.
pub struct HttpFetcher {
    http: reqwest::Client,
    throttle: Throttle,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig, throttle: Throttle) -> Result<Self, ScrapeError> {
        let http = build_client(config, config.download_timeout)?;
        Ok(Self { http, throttle })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ScrapeError> {
        self.throttle.wait().await;

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();

        Ok(FetchedImage {
            bytes,
            content_type,
            final_url,
        })
    }
}

/// File extension (no dot) for a payload: from `Content-Type` when it names
/// an image type, else from the URL path, else `jpg`.
pub fn extension_for(content_type: Option<&str>, url: &str) -> &'static str {
    if let Some(ct) = content_type {
        let mime = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => return "jpg",
            "image/png" => return "png",
            "image/webp" => return "webp",
            "image/svg+xml" => return "svg",
            "image/gif" => return "gif",
            _ => {}
        }
    }

    let path = url.split(['?', '#']).next().unwrap_or("");
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()) {
        Some(e) if e == "jpg" || e == "jpeg" => "jpg",
        Some(e) if e == "png" => "png",
        Some(e) if e == "webp" => "webp",
        Some(e) if e == "svg" => "svg",
        Some(e) if e == "gif" => "gif",
        _ => "jpg",
    }
}

/// Reject payloads under `min_bytes`; such responses are error pages or
/// tracking pixels rather than product shots.
pub fn check_size(image: &FetchedImage, min_bytes: u64, url: &str) -> Result<(), ScrapeError> {
    let size = image.bytes.len() as u64;
    if size < min_bytes {
        return Err(ScrapeError::TooSmall {
            size,
            min: min_bytes,
            url: url.to_string(),
        });
    }
    Ok(())
}

/// How downloaded files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStyle {
    /// `<id>.<ext>`; a re-run overwrites the entry's own file.
    #[default]
    Deterministic,
    /// `<provider prefix><id>_<random>.<ext>`; never collides.
    Randomized,
}

impl FilenameStyle {
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Randomized => "randomized",
        }
    }
}

impl fmt::Display for FilenameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for FilenameStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" | "id" => Ok(Self::Deterministic),
            "randomized" | "random" => Ok(Self::Randomized),
            other => Err(format!(
                "unknown filename style '{}' (expected deterministic or randomized)",
                other
            )),
        }
    }
}

/// Filename for a new download.
pub fn image_filename(style: FilenameStyle, provider: Provider, id: &str, ext: &str) -> String {
    let id = id_file_stem(id);
    match style {
        FilenameStyle::Deterministic => format!("{}.{}", id, ext),
        FilenameStyle::Randomized => {
            let token = uuid::Uuid::new_v4().simple().to_string();
            format!("{}{}_{}.{}", provider.filename_prefix(), id, &token[..8], ext)
        }
    }
}

/// A payload written to the image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

/// Write `bytes` to `dir/filename` via a temp file and rename, so a failed
/// write never leaves a truncated image behind.
pub fn store_image(
    dir: &Path,
    filename: &str,
    bytes: &[u8],
    sha256: &str,
) -> Result<StoredImage, ScrapeError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    let tmp = dir.join(format!(".{}.part", filename));
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(StoredImage {
        filename: filename.to_string(),
        path,
        sha256: sha256.to_string(),
        size: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_content_type() {
        assert_eq!(extension_for(Some("image/png"), "https://x/a.jpg"), "png");
        assert_eq!(extension_for(Some("image/jpeg; charset=binary"), "https://x/a"), "jpg");
        assert_eq!(extension_for(Some("image/svg+xml"), "https://x/a"), "svg");
        assert_eq!(extension_for(Some("IMAGE/WEBP"), "https://x/a"), "webp");
    }

    #[test]
    fn extension_falls_back_to_url_then_jpg() {
        assert_eq!(extension_for(Some("application/octet-stream"), "https://x/a.webp?w=1"), "webp");
        assert_eq!(extension_for(None, "https://x/photo.JPEG"), "jpg");
        assert_eq!(extension_for(None, "https://x.com/photo-123?fm=png"), "jpg");
        assert_eq!(extension_for(None, "https://x.com/"), "jpg");
    }

    #[test]
    fn size_guard() {
        let image = FetchedImage {
            bytes: vec![0u8; 100],
            content_type: None,
            final_url: "u".into(),
        };
        assert!(matches!(
            check_size(&image, 10 * 1024, "u"),
            Err(ScrapeError::TooSmall { size: 100, .. })
        ));
        assert!(check_size(&image, 100, "u").is_ok());
    }

    #[test]
    fn filenames_follow_style() {
        assert_eq!(
            image_filename(FilenameStyle::Deterministic, Provider::TagSearch, "p1", "jpg"),
            "p1.jpg"
        );
        let spaced = image_filename(FilenameStyle::Deterministic, Provider::TagSearch, "p 1", "jpg");
        let underscored = image_filename(FilenameStyle::Deterministic, Provider::TagSearch, "p_1", "jpg");
        assert!(spaced.starts_with("p_1_") && spaced.ends_with(".jpg"));
        assert_eq!(underscored, "p_1.jpg");
        let a = image_filename(FilenameStyle::Randomized, Provider::HtmlScrape, "p1", "png");
        let b = image_filename(FilenameStyle::Randomized, Provider::HtmlScrape, "p1", "png");
        assert!(a.starts_with("pp_pin_p1_") && a.ends_with(".png"));
        assert_ne!(a, b);
        let remap = image_filename(FilenameStyle::Randomized, Provider::TagSearch, "p1", "jpg");
        assert!(remap.starts_with("pppp1_"));
    }

    #[test]
    fn store_writes_and_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let stored = store_image(tmp.path(), "p1.jpg", b"bytes", "digest").unwrap();
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"bytes");
        assert_eq!(stored.size, 5);
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn style_parses() {
        assert_eq!("random".parse::<FilenameStyle>().unwrap(), FilenameStyle::Randomized);
        assert!("weird".parse::<FilenameStyle>().is_err());
    }
}
