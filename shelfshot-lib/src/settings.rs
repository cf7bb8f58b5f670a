//! Application settings: paths, HTTP behaviour, scoring weights and output
//! options, read from a TOML file.
//!
//! Resolution order for the settings file:
//!
//! 1. `--config <file>` (must exist)
//! 2. `./shelfshot.toml`
//! 3. `<config dir>/shelfshot/settings.toml`
//! 4. Built-in defaults
//!
//! Every field is optional in the file; missing fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::scorer::ScoreWeights;

/// Project-local settings file name, looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "shelfshot.toml";

/// Canonical path of the per-user settings file.
pub fn user_settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("shelfshot").join("settings.toml")
}

/// Pick the settings file to read, if any, following the resolution order.
pub fn resolve_settings_path(cli_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = cli_override {
        return Some(p.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.is_file() {
        return Some(local);
    }
    let user = user_settings_path();
    user.is_file().then_some(user)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// The catalog JSON document.
    pub catalog: PathBuf,
    /// Flat directory holding product images.
    pub image_dir: PathBuf,
    /// URL prefix the storefront serves `image_dir` under.
    pub public_prefix: String,
    /// Mapping CSVs, run logs, galleries and timestamped backups.
    pub artifacts_dir: PathBuf,
    /// Local `.env` file consulted for API keys.
    pub env_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("data/products.json"),
            image_dir: PathBuf::from("public/images/products"),
            public_prefix: "/images/products".to_string(),
            artifacts_dir: PathBuf::from("artifacts"),
            env_file: PathBuf::from(".env"),
        }
    }
}

impl PathSettings {
    pub fn backups_dir(&self) -> PathBuf {
        self.artifacts_dir.join("backups")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Browser-like user agent; some providers refuse bare clients.
    pub user_agent: String,
    pub search_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Pause between consecutive external requests.
    pub politeness_delay_ms: u64,
    /// Pause before retrying a query that returned nothing.
    pub retry_pause_ms: u64,
    pub max_redirects: usize,
    /// Downloads smaller than this are treated as broken.
    pub min_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            search_timeout_secs: 15,
            download_timeout_secs: 30,
            politeness_delay_ms: 600,
            retry_pause_ms: 2500,
            max_redirects: 1,
            min_bytes: 10 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Append `?v=<stamp>` to new image URLs so browsers refetch them.
    pub cache_bust: bool,
    /// Entries shown in the review gallery.
    pub gallery_sample: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            cache_bust: true,
            gallery_sample: 48,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub http: HttpSettings,
    pub scoring: ScoreWeights,
    pub output: OutputSettings,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        toml::from_str(text).map_err(|e| CatalogError::settings(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, CatalogError> {
        toml::to_string_pretty(self).map_err(|e| CatalogError::settings(e.to_string()))
    }

    /// Read settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| match e {
            CatalogError::Settings(msg) => {
                CatalogError::settings(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load using the resolution order. Returns the settings and the file
    /// they came from (`None` for built-in defaults).
    pub fn load(cli_override: Option<&Path>) -> Result<(Self, Option<PathBuf>), CatalogError> {
        match resolve_settings_path(cli_override) {
            Some(path) => {
                let settings = Self::load_from(&path)?;
                log::debug!("Loaded settings from {}", path.display());
                Ok((settings, Some(path)))
            }
            None => {
                log::debug!("No settings file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    /// Write settings to `path` atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = self.to_toml_string()?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
