use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use shelfshot_lib::Settings;
use shelfshot_lib::settings::{LOCAL_SETTINGS_FILE, resolve_settings_path, user_settings_path};
use shelfshot_scraper::credentials::{ApiKey, KeySource};
use shelfshot_scraper::ensure_env_file;

use crate::error::CliError;

fn mask_value(s: &str) -> String {
    let head: String = s.chars().take(4).collect();
    if s.chars().count() <= 6 {
        "****".to_string()
    } else {
        format!("{}****", head)
    }
}

fn show_path(label: &str, path: &Path) {
    let status = if path.exists() {
        "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
    } else {
        "(not found)".if_supports_color(Stdout, |t| t.dimmed()).to_string()
    };
    log::info!(
        "  {} {} {}",
        format!("{}:", label).if_supports_color(Stdout, |t| t.cyan()),
        path.display(),
        status,
    );
}

/// Show effective settings, where they came from, and the API key source.
pub(crate) fn run_config_show(config: Option<&Path>) -> Result<(), CliError> {
    let (settings, source) = Settings::load(config)?;

    log::info!(
        "{}",
        "shelfshot configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    match &source {
        Some(path) => show_path("settings", path),
        None => log::info!(
            "  {} {}",
            "settings:".if_supports_color(Stdout, |t| t.cyan()),
            "built-in defaults".if_supports_color(Stdout, |t| t.dimmed()),
        ),
    }
    show_path("catalog", &settings.paths.catalog);
    show_path("image_dir", &settings.paths.image_dir);
    show_path("artifacts_dir", &settings.paths.artifacts_dir);
    show_path("env_file", &settings.paths.env_file);
    log::info!(
        "  {} {}",
        "public_prefix:".if_supports_color(Stdout, |t| t.cyan()),
        settings.paths.public_prefix,
    );
    log::info!("");

    match ApiKey::load(&settings.paths.env_file) {
        Ok(key) => log::info!(
            "  {} {} {}",
            "api key:".if_supports_color(Stdout, |t| t.cyan()),
            mask_value(key.expose()),
            format!("({})", key.source()).if_supports_color(Stdout, |t| t.dimmed()),
        ),
        Err(_) => log::info!(
            "  {} {} {}",
            "api key:".if_supports_color(Stdout, |t| t.cyan()),
            "not set".if_supports_color(Stdout, |t| t.yellow()),
            format!("({})", KeySource::Missing).if_supports_color(Stdout, |t| t.dimmed()),
        ),
    }
    log::info!("");

    let http = &settings.http;
    log::info!(
        "  {} search {}s, download {}s, delay {}ms, retry pause {}ms, min {} bytes",
        "http:".if_supports_color(Stdout, |t| t.cyan()),
        http.search_timeout_secs,
        http.download_timeout_secs,
        http.politeness_delay_ms,
        http.retry_pause_ms,
        http.min_bytes,
    );
    let s = &settings.scoring;
    log::info!(
        "  {} tag {}, hint {}, wide +{} (>= {}px), popular +{} (>= {} likes), min {}",
        "scoring:".if_supports_color(Stdout, |t| t.cyan()),
        s.tag_weight,
        s.hint_weight,
        s.wide_bonus,
        s.wide_min_width,
        s.popular_bonus,
        s.popular_min_likes,
        s.min_score,
    );
    log::info!(
        "  {} cache_bust {}, gallery sample {}",
        "output:".if_supports_color(Stdout, |t| t.cyan()),
        settings.output.cache_bust,
        settings.output.gallery_sample,
    );
    Ok(())
}

/// Print the settings file that would be read, or where `init` writes.
pub(crate) fn run_config_path(config: Option<&Path>) {
    match resolve_settings_path(config) {
        Some(path) => log::info!("{}", path.display()),
        None => log::info!(
            "{} {}",
            user_settings_path().display(),
            "(not created yet)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
    }
}

/// Write default settings and create the `.env` key file.
pub(crate) fn run_config_init(
    config: Option<&Path>,
    user: bool,
    force: bool,
) -> Result<(), CliError> {
    let path: PathBuf = match (config, user) {
        (Some(p), _) => p.to_path_buf(),
        (None, true) => user_settings_path(),
        (None, false) => PathBuf::from(LOCAL_SETTINGS_FILE),
    };

    if path.exists() && !force {
        return Err(CliError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let settings = Settings::default();
    settings.save(&path)?;
    log::info!(
        "{} Settings written to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );

    if ensure_env_file(&settings.paths.env_file)? {
        log::info!(
            "  Add your key to {}",
            settings.paths.env_file.display().if_supports_color(Stdout, |t| t.cyan()),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_a_short_prefix() {
        assert_eq!(mask_value("abc"), "****");
        assert_eq!(mask_value("12345678-abcdef"), "1234****");
    }
}
