//! shelfshot CLI
//!
//! Command-line interface for sourcing, deduplicating and auditing product
//! catalog images.

mod cli_types;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use shelfshot_scraper::Preset;

use cli_types::{Cli, Commands, ConfigAction, MappingsAction};
use commands::run::RunOptions;
use error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!(
                "{} {}",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                e,
            );
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            preset,
            batch,
            paths,
            links,
            providers,
            min_score,
            strict,
            keep_existing,
            no_dedup,
            no_cache_bust,
            no_gallery,
            dry_run,
        } => {
            let settings = commands::load_settings(config, &paths)?;
            let opts = RunOptions {
                preset,
                batch,
                links,
                providers,
                min_score,
                strict,
                keep_existing,
                no_dedup,
                no_cache_bust,
                no_gallery,
                dry_run,
            };
            commands::run::run_run(&settings, opts, cli.quiet)
        }
        Commands::Duplicates { paths } => {
            let settings = commands::load_settings(config, &paths)?;
            commands::gallery::run_duplicates(&settings)
        }
        Commands::Gallery {
            paths,
            sample,
            output,
        } => {
            let settings = commands::load_settings(config, &paths)?;
            commands::gallery::run_gallery(&settings, sample, output)
        }
        Commands::Mappings { action } => match action {
            MappingsAction::Merge { inputs, output } => {
                commands::mappings::run_merge(&inputs, &output)
            }
        },
        Commands::Presets => {
            run_presets();
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(config),
            ConfigAction::Path => {
                commands::config::run_config_path(config);
                Ok(())
            }
            ConfigAction::Init { user, force } => {
                commands::config::run_config_init(config, user, force)
            }
        },
    }
}

fn run_presets() {
    log::info!("{}", "Job presets:".if_supports_color(Stdout, |t| t.bold()));
    for preset in Preset::all() {
        log::info!(
            "  {} {}",
            format!("{:<14}", preset.short_name()).if_supports_color(Stdout, |t| t.cyan()),
            preset.description(),
        );
    }
}
