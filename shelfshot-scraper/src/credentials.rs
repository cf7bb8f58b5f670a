use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::ScrapeError;

/// Canonical environment variable for the tag-search API key.
pub const API_KEY_VAR: &str = "PIXABAY_API_KEY";

/// Variables checked for the key, in priority order.
pub const API_KEY_VARS: &[&str] = &[API_KEY_VAR, "PIXABAY_KEY"];

/// Where the API key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Loaded from a process environment variable.
    EnvVar(&'static str),
    /// Loaded from the `.env` file.
    EnvFile(PathBuf),
    /// Not set anywhere (or set to an empty value).
    Missing,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::EnvFile(path) => write!(f, "{}", path.display()),
            Self::Missing => write!(f, "not set"),
        }
    }
}

/// The tag-search API key. `Debug` never prints the value.
#[derive(Clone)]
pub struct ApiKey {
    value: String,
    source: KeySource,
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: KeySource::Missing,
        }
    }

    /// Load the key from the process environment, else from `env_file`.
    ///
    /// Priority: `PIXABAY_API_KEY` > `PIXABAY_KEY` > `.env` file (same
    /// names). Empty values count as unset.
    pub fn load(env_file: &Path) -> Result<Self, ScrapeError> {
        Self::resolve(|var| std::env::var(var).ok(), env_file)
    }

    /// [`ApiKey::load`] with an injectable environment lookup.
    pub fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        env_file: &Path,
    ) -> Result<Self, ScrapeError> {
        for &var in API_KEY_VARS {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                return Ok(Self {
                    value: value.trim().to_string(),
                    source: KeySource::EnvVar(var),
                });
            }
        }

        if let Some(value) = read_env_file_key(env_file) {
            return Ok(Self {
                value,
                source: KeySource::EnvFile(env_file.to_path_buf()),
            });
        }

        Err(ScrapeError::MissingApiKey {
            var: API_KEY_VAR,
            env_file: env_file.to_path_buf(),
        })
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> &KeySource {
        &self.source
    }
}

/// Read the first non-empty key variable from a `.env` file without
/// touching the process environment.
fn read_env_file_key(env_file: &Path) -> Option<String> {
    let iter = dotenv::from_path_iter(env_file).ok()?;
    let pairs: Vec<(String, String)> = iter.filter_map(Result::ok).collect();
    API_KEY_VARS.iter().find_map(|var| {
        pairs
            .iter()
            .find(|(k, v)| k == var && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}

/// Describe where the key would come from, for `config show`.
pub fn key_source(env_file: &Path) -> KeySource {
    ApiKey::load(env_file)
        .map(|k| k.source)
        .unwrap_or(KeySource::Missing)
}

/// Create `env_file` with an empty key entry if it does not exist.
///
/// Returns true if the file was created.
pub fn ensure_env_file(env_file: &Path) -> io::Result<bool> {
    if env_file.exists() {
        return Ok(false);
    }
    if let Some(parent) = env_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(env_file)?;
    writeln!(file, "# Tag-search API key (https://pixabay.com/api/docs/)")?;
    writeln!(file, "{}=", API_KEY_VAR)?;
    log::info!("Created {} with an empty {}", env_file.display(), API_KEY_VAR);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn env_var_wins_over_file() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join(".env");
        std::fs::write(&env_file, "PIXABAY_API_KEY=from-file\n").unwrap();

        let key = ApiKey::resolve(
            |v| (v == "PIXABAY_KEY").then(|| "from-alias".to_string()),
            &env_file,
        )
        .unwrap();
        assert_eq!(key.expose(), "from-alias");
        assert_eq!(key.source(), &KeySource::EnvVar("PIXABAY_KEY"));
    }

    #[test]
    fn falls_back_to_env_file() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join(".env");
        std::fs::write(&env_file, "OTHER=1\nPIXABAY_KEY=abc123\n").unwrap();

        let key = ApiKey::resolve(no_env, &env_file).unwrap();
        assert_eq!(key.expose(), "abc123");
        assert_eq!(key.source(), &KeySource::EnvFile(env_file));
    }

    #[test]
    fn empty_values_are_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join(".env");
        ensure_env_file(&env_file).unwrap();

        let err = ApiKey::resolve(|_| Some("  ".to_string()), &env_file).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingApiKey { .. }));
    }

    #[test]
    fn ensure_env_file_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join(".env");
        assert!(ensure_env_file(&env_file).unwrap());
        std::fs::write(&env_file, "PIXABAY_API_KEY=keep\n").unwrap();
        assert!(!ensure_env_file(&env_file).unwrap());
        assert_eq!(
            std::fs::read_to_string(&env_file).unwrap(),
            "PIXABAY_API_KEY=keep\n"
        );
    }

    #[test]
    fn debug_redacts_value() {
        let key = ApiKey::new("secret-value");
        assert!(!format!("{:?}", key).contains("secret-value"));
    }
}
