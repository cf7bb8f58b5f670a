use shelfshot_lib::CatalogError;

/// Errors that can occur while sourcing images.
///
/// Adapters never surface these (they fail soft); they come from the
/// downloader, the credential loader and job setup.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Download too small ({size} bytes, need at least {min}): {url}")]
    TooSmall { size: u64, min: u64, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing API key: set {var} or add it to {}", env_file.display())]
    MissingApiKey {
        var: &'static str,
        env_file: std::path::PathBuf,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ScrapeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is a setup problem that must stop the job before
    /// anything is written.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey { .. } | Self::Config(_) | Self::Catalog(_)
        )
    }
}
