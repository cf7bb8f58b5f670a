use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use shelfshot_lib::gallery::{GalleryOptions, sample_evenly, write_gallery};
use shelfshot_lib::{CatalogStore, DedupIndex, Settings};

use crate::commands::run::image_base;
use crate::error::CliError;

/// Run the `gallery` command.
pub(crate) fn run_gallery(
    settings: &Settings,
    sample: Option<usize>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let catalog = CatalogStore::new(&settings.paths.catalog).load()?;
    let count = sample.unwrap_or(settings.output.gallery_sample);
    let entries: Vec<_> = sample_evenly(catalog.entries(), count);

    let path = output.unwrap_or_else(|| settings.paths.artifacts_dir.join("gallery.html"));
    let options = GalleryOptions {
        title: format!("shelfshot catalog sample ({} of {})", entries.len(), catalog.len()),
        public_prefix: settings.paths.public_prefix.clone(),
        image_base: image_base(&settings.paths.image_dir),
    };
    write_gallery(&path, &entries, &options)?;
    log::info!(
        "{} Gallery written to {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    Ok(())
}

/// Run the `duplicates` command: report shared images without changing
/// anything.
pub(crate) fn run_duplicates(settings: &Settings) -> Result<(), CliError> {
    let catalog = CatalogStore::new(&settings.paths.catalog).load()?;
    let index = DedupIndex::scan_dir(&settings.paths.image_dir)?;
    let groups = shelfshot_lib::dedup::duplicate_groups(
        catalog.entries(),
        &index,
        &settings.paths.public_prefix,
    );

    if groups.is_empty() {
        log::info!(
            "{} No shared images among {} entries ({} files indexed)",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            catalog.len(),
            index.len(),
        );
        return Ok(());
    }

    let affected: usize = groups.iter().map(|g| g.others().len()).sum();
    for group in &groups {
        log::info!(
            "{} {}",
            group.keeper().if_supports_color(Stdout, |t| t.bold()),
            format!("({}...)", group.short_digest())
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
        for id in group.others() {
            log::info!("  {} {}", "=".if_supports_color(Stdout, |t| t.yellow()), id);
        }
    }
    log::warn!(
        "{} {} groups, {} entries would be re-sourced by `shelfshot run dedup`",
        "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
        groups.len(),
        affected,
    );
    Ok(())
}
