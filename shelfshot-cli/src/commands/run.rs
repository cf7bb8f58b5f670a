use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use shelfshot_core::Provider;
use shelfshot_lib::async_util::run_with_events;
use shelfshot_lib::gallery::{GalleryOptions, sample_evenly, write_gallery};
use shelfshot_lib::mapping::read_manual_links;
use shelfshot_lib::{CatalogStore, SelectionMode, Settings, UsedImages};
use shelfshot_scraper::run::cache_bust_stamp;
use shelfshot_scraper::{
    HttpConfig, HttpFetcher, JobArtifacts, JobContext, JobEvent, JobReport, LogEntry, Preset,
    RunPolicy, SourceConfig, Throttle, build_sources, ensure_env_file, execute_job,
};

use crate::cli_types::BatchArgs;
use crate::error::CliError;

/// Flags of `shelfshot run` beyond the preset and paths.
pub(crate) struct RunOptions {
    pub preset: Preset,
    pub batch: BatchArgs,
    pub links: Option<PathBuf>,
    pub providers: Option<Vec<Provider>>,
    pub min_score: Option<i32>,
    pub strict: bool,
    pub keep_existing: bool,
    pub no_dedup: bool,
    pub no_cache_bust: bool,
    pub no_gallery: bool,
    pub dry_run: bool,
}

/// Expand the preset and apply command-line overrides.
pub(crate) fn build_policy(opts: &RunOptions) -> Result<RunPolicy, CliError> {
    let mut policy = RunPolicy::preset(opts.preset);

    if let Some(providers) = &opts.providers {
        if providers.is_empty() {
            return Err(CliError::config("--providers needs at least one provider"));
        }
        policy.providers = providers.clone();
    }
    if opts.min_score.is_some() {
        policy.min_score = opts.min_score;
    }
    if opts.strict {
        policy.selection = SelectionMode::Strict;
    }
    policy.keep_existing_on_no_match |= opts.keep_existing;
    policy.dedup &= !opts.no_dedup;
    policy.force |= opts.batch.force;
    policy.sample = opts.batch.sample.or(policy.sample);

    policy.filter.category = opts.batch.category.clone();
    policy.filter.id_range = opts.batch.range.clone();
    if let Some(ids) = &opts.batch.ids {
        policy.filter.only_ids = Some(ids.iter().map(|s| s.trim().to_string()).collect());
    }

    if policy.providers.contains(&Provider::Manual) {
        let links = opts
            .links
            .as_ref()
            .ok_or_else(|| CliError::config("the manual provider needs --links <CSV>"))?;
        // Entries without a link have nothing to try
        if policy.filter.only_ids.is_none() {
            let ids: HashSet<String> = read_manual_links(links)?.into_keys().collect();
            policy.filter.only_ids = Some(ids);
        }
    }

    Ok(policy)
}

fn print_policy(policy: &RunPolicy, settings: &Settings) {
    let providers: Vec<&str> = policy.providers.iter().map(|p| p.short_name()).collect();
    log::info!(
        "{} {}",
        "Preset:".if_supports_color(Stdout, |t| t.bold()),
        policy.preset.if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "{}",
        format!(
            "  providers: {} | selection: {} | dedup: {} | force: {} | files: {}",
            providers.join(", "),
            policy.selection,
            policy.dedup,
            policy.force,
            policy.filename_style,
        )
        .if_supports_color(Stdout, |t| t.dimmed()),
    );
    if !policy.filter.is_empty() || policy.sample.is_some() {
        let mut parts = Vec::new();
        if let Some(c) = &policy.filter.category {
            parts.push(format!("category {}", c));
        }
        if let Some(r) = &policy.filter.id_range {
            parts.push(format!("range {}", r));
        }
        if let Some(ids) = &policy.filter.only_ids {
            parts.push(format!("{} listed ids", ids.len()));
        }
        if let Some(n) = policy.sample {
            parts.push(format!("sample {}", n));
        }
        log::info!(
            "{}",
            format!("  batch: {}", parts.join(", ")).if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    log::info!(
        "  Catalog: {}",
        settings.paths.catalog.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "  Images:  {}",
        settings.paths.image_dir.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!("");
}

fn print_record(record: &LogEntry) {
    match record {
        LogEntry::Downloaded {
            id,
            provider,
            filename,
            ..
        } => log::info!(
            "  {} {} -> {} {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            id,
            filename,
            format!("({})", provider).if_supports_color(Stdout, |t| t.dimmed()),
        ),
        LogEntry::Kept { id, reason } => log::info!(
            "  {} {} kept {}",
            "=".if_supports_color(Stdout, |t| t.cyan()),
            id,
            format!("({})", reason).if_supports_color(Stdout, |t| t.dimmed()),
        ),
        LogEntry::Placeholder { id, reason } => log::info!(
            "  {} {} placeholder {}",
            "?".if_supports_color(Stdout, |t| t.yellow()),
            id,
            format!("({})", reason).if_supports_color(Stdout, |t| t.dimmed()),
        ),
        LogEntry::Skipped { id, reason } => log::debug!("  - {} skipped: {}", id, reason),
        LogEntry::Error { id, message } => log::warn!(
            "  {} {}: {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            id,
            message,
        ),
    }
}

fn print_summary(report: &JobReport) {
    let summary = report.outcome.log.summary();
    log::info!("");
    log::info!("{}", "Summary:".if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  {} {} processed, {} changed",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        summary.processed(),
        summary.changed,
    );
    log::info!(
        "    downloaded {}, kept {}, placeholders {}, skipped {}",
        summary.downloaded,
        summary.kept,
        summary.placeholders,
        summary.skipped,
    );
    if summary.failed_downloads > 0 {
        log::warn!(
            "  {} {} failed downloads",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            summary.failed_downloads,
        );
    }
    if summary.errors > 0 {
        log::warn!(
            "  {} {} errors",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            summary.errors,
        );
    }
    log::info!(
        "  Backup:  {}",
        report.backup.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!(
        "  Mapping: {}",
        report.mapping_csv.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!(
        "  Log:     {}",
        report.log_file.display().if_supports_color(Stdout, |t| t.dimmed()),
    );
}

/// Gallery of the entries this job resolved, for a quick visual check.
fn write_review_gallery(
    report: &JobReport,
    settings: &Settings,
    artifacts: &JobArtifacts,
    preset: Preset,
) -> std::io::Result<PathBuf> {
    let touched: HashSet<&str> = report.outcome.rows.iter().map(|r| r.id.as_str()).collect();
    let entries: Vec<_> = report
        .outcome
        .catalog
        .entries()
        .iter()
        .filter(|e| touched.contains(e.id.as_str()))
        .collect();
    let sample = sample_evenly(&entries, settings.output.gallery_sample);
    let sample: Vec<_> = sample.into_iter().copied().collect();

    let path = artifacts
        .artifacts_dir
        .join(format!("{}_gallery.html", preset.short_name().replace('-', "_")));
    let options = GalleryOptions {
        title: format!("shelfshot {} review", preset),
        public_prefix: settings.paths.public_prefix.clone(),
        image_base: image_base(&settings.paths.image_dir),
    };
    write_gallery(&path, &sample, &options)?;
    Ok(path)
}

/// Absolute image directory for gallery `src` attributes.
pub(crate) fn image_base(image_dir: &Path) -> String {
    std::path::absolute(image_dir)
        .unwrap_or_else(|_| image_dir.to_path_buf())
        .display()
        .to_string()
}

/// Run the `run` command.
pub(crate) fn run_run(settings: &Settings, opts: RunOptions, quiet: bool) -> Result<(), CliError> {
    let policy = build_policy(&opts)?;
    let store = CatalogStore::new(&settings.paths.catalog);

    // Fatal checks come before anything is written
    if !store.exists() {
        return Err(shelfshot_lib::CatalogError::NotFound(store.path().to_path_buf()).into());
    }

    print_policy(&policy, settings);

    if opts.dry_run {
        let catalog = store.load()?;
        let matching = catalog
            .entries()
            .iter()
            .filter(|e| policy.filter.matches(e))
            .count();
        let limit = policy.sample.map_or(matching, |n| n.min(matching));
        log::info!(
            "{}",
            format!(
                "Dry run: {} of {} entries match, up to {} would be processed",
                matching,
                catalog.len(),
                limit
            )
            .if_supports_color(Stdout, |t| t.dimmed()),
        );
        return Ok(());
    }

    let env_file = &settings.paths.env_file;
    if policy.providers.contains(&Provider::TagSearch) {
        ensure_env_file(env_file)?;
    }

    let http = HttpConfig::from(&settings.http);
    let throttle = Throttle::new(http.politeness_delay);
    let sources = build_sources(
        &policy.providers,
        &SourceConfig {
            http: http.clone(),
            throttle: throttle.clone(),
            env_file: env_file.clone(),
            manual_links: opts.links.clone(),
        },
    )?;
    let fetcher = HttpFetcher::new(&http, throttle)?;

    let artifacts = JobArtifacts::new(&settings.paths.artifacts_dir);
    let cache_bust = (settings.output.cache_bust && !opts.no_cache_bust).then(cache_bust_stamp);
    let ctx = JobContext {
        sources: &sources,
        fetcher: &fetcher,
        image_dir: settings.paths.image_dir.clone(),
        public_prefix: settings.paths.public_prefix.clone(),
        weights: settings.scoring.clone(),
        min_bytes: http.min_bytes,
        retry_pause: http.retry_pause,
        cache_bust,
        image_backup_dir: Some(artifacts.backups_dir().join("images")),
    };

    let pb = if quiet || log::max_level() < LevelFilter::Info {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("/-\\|"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::runtime(e.to_string()))?;

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel::<JobEvent>();
    let job = execute_job(&store, &artifacts, &policy, &ctx, UsedImages::new(), event_tx);

    let result = rt.block_on(run_with_events(job, event_rx, |e| match e {
        JobEvent::Started { total } => pb.set_length(total as u64),
        JobEvent::EntryStarted { ref id, .. } => pb.set_message(id.clone()),
        JobEvent::StateChanged { ref id, state, .. } => {
            pb.set_message(format!("{} {}", id, state));
        }
        JobEvent::EntryFinished { ref record, .. } => {
            if !matches!(record, LogEntry::Skipped { .. }) {
                pb.inc(1);
            }
            pb.suspend(|| print_record(record));
        }
        JobEvent::Done => pb.set_message("saving"),
    }));
    pb.finish_and_clear();

    let report = result?;
    print_summary(&report);

    if !opts.no_gallery && !report.outcome.rows.is_empty() {
        match write_review_gallery(&report, settings, &artifacts, policy.preset) {
            Ok(path) => log::info!(
                "  Gallery: {}",
                path.display().if_supports_color(Stdout, |t| t.dimmed()),
            ),
            Err(e) => log::warn!("Warning: could not write gallery: {}", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(preset: Preset) -> RunOptions {
        RunOptions {
            preset,
            batch: BatchArgs::default(),
            links: None,
            providers: None,
            min_score: None,
            strict: false,
            keep_existing: false,
            no_dedup: false,
            no_cache_bust: false,
            no_gallery: false,
            dry_run: false,
        }
    }

    #[test]
    fn flags_override_the_preset() {
        let mut opts = options(Preset::Stock);
        opts.batch.force = true;
        opts.batch.sample = Some(5);
        opts.batch.category = Some("soap".into());
        opts.strict = true;
        opts.no_dedup = true;
        opts.min_score = Some(4);

        let policy = build_policy(&opts).unwrap();
        assert!(policy.force);
        assert!(!policy.dedup);
        assert_eq!(policy.sample, Some(5));
        assert_eq!(policy.min_score, Some(4));
        assert_eq!(policy.selection, SelectionMode::Strict);
        assert_eq!(policy.filter.category.as_deref(), Some("soap"));
        assert_eq!(policy.providers, vec![Provider::CategoryTemplate]);
    }

    #[test]
    fn manual_needs_links_and_limits_to_their_ids() {
        assert!(matches!(
            build_policy(&options(Preset::Manual)),
            Err(CliError::Config(_))
        ));

        let tmp = tempfile::tempdir().unwrap();
        let links = tmp.path().join("links.csv");
        std::fs::write(&links, "id,url\np2,https://x/a.jpg\np9,https://x/b.jpg\n").unwrap();
        let mut opts = options(Preset::Manual);
        opts.links = Some(links);

        let policy = build_policy(&opts).unwrap();
        let ids = policy.filter.only_ids.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("p2") && ids.contains("p9"));
    }

    #[test]
    fn empty_provider_list_is_rejected() {
        let mut opts = options(Preset::Remap);
        opts.providers = Some(Vec::new());
        assert!(build_policy(&opts).is_err());
    }
}
