pub(crate) mod config;
pub(crate) mod gallery;
pub(crate) mod mappings;
pub(crate) mod run;

use std::path::Path;

use shelfshot_lib::Settings;

use crate::cli_types::PathArgs;
use crate::error::CliError;

/// Load settings through the usual resolution order, then apply path flags.
pub(crate) fn load_settings(config: Option<&Path>, paths: &PathArgs) -> Result<Settings, CliError> {
    let (mut settings, source) = Settings::load(config)?;
    match source {
        Some(path) => log::debug!("Settings: {}", path.display()),
        None => log::debug!("Settings: built-in defaults"),
    }
    if let Some(catalog) = &paths.catalog {
        settings.paths.catalog = catalog.clone();
    }
    if let Some(dir) = &paths.image_dir {
        settings.paths.image_dir = dir.clone();
    }
    if let Some(dir) = &paths.artifacts_dir {
        settings.paths.artifacts_dir = dir.clone();
    }
    Ok(settings)
}
