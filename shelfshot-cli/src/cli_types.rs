//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use shelfshot_core::Provider;
use shelfshot_scraper::{IdRange, Preset};

#[derive(Parser)]
#[command(name = "shelfshot")]
#[command(about = "Source, deduplicate and audit product images for a catalog", long_about = None)]
pub(crate) struct Cli {
    /// Settings file (default: ./shelfshot.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Paths that override the settings file.
#[derive(Args, Clone, Default)]
pub(crate) struct PathArgs {
    /// Catalog JSON file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory holding product images
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Directory for backups, mapping CSVs, logs and galleries
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,
}

/// Which entries a job touches.
#[derive(Args, Clone, Default)]
pub(crate) struct BatchArgs {
    /// Only entries in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// Only entries whose id falls in FROM..TO (natural order, inclusive)
    #[arg(long)]
    pub range: Option<IdRange>,

    /// Only these entry ids
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<String>>,

    /// Process at most N entries
    #[arg(long, env = "SHELFSHOT_SAMPLE")]
    pub sample: Option<usize>,

    /// Re-process entries that already have a local image
    #[arg(long, env = "SHELFSHOT_FORCE")]
    pub force: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run an image job preset over the catalog
    Run {
        /// Job preset (remap, fill-missing, pinterest, stock, manual, dedup)
        preset: Preset,

        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        paths: PathArgs,

        /// CSV of id,url links (required for the manual preset)
        #[arg(long)]
        links: Option<PathBuf>,

        /// Override the preset's provider order (e.g., pixabay,unsplash)
        #[arg(long, value_delimiter = ',')]
        providers: Option<Vec<Provider>>,

        /// Minimum candidate score
        #[arg(long)]
        min_score: Option<i32>,

        /// Only accept candidates meeting the minimum score
        #[arg(long)]
        strict: bool,

        /// Keep an entry's current image when nothing better is found
        #[arg(long)]
        keep_existing: bool,

        /// Allow the same image content on several entries
        #[arg(long)]
        no_dedup: bool,

        /// Don't append ?v=<stamp> to new image URLs
        #[arg(long)]
        no_cache_bust: bool,

        /// Skip the HTML review gallery
        #[arg(long)]
        no_gallery: bool,

        /// Show the selected entries and policy without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// List catalog entries that share the same image content
    Duplicates {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Write an HTML gallery of a sample of catalog entries
    Gallery {
        #[command(flatten)]
        paths: PathArgs,

        /// Number of entries to include (default from settings)
        #[arg(long)]
        sample: Option<usize>,

        /// Output file (default: <artifacts>/gallery.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Work with mapping CSV files
    Mappings {
        #[command(subcommand)]
        action: MappingsAction,
    },

    /// List job presets
    Presets,

    /// Manage settings and the API key file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum MappingsAction {
    /// Merge mapping CSVs, later files winning per id
    Merge {
        /// Input CSV files, oldest first
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show effective settings and the API key source
    Show,

    /// Print the settings file path
    Path,

    /// Write default settings and create the .env file
    Init {
        /// Write to the user config dir instead of ./shelfshot.toml
        #[arg(long)]
        user: bool,

        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}
