pub mod client;
pub mod credentials;
pub mod download;
pub mod error;
pub mod log;
pub mod policy;
pub mod run;
pub mod sources;

pub use client::{HttpConfig, Throttle};
pub use credentials::{ApiKey, KeySource, ensure_env_file, key_source};
pub use download::{FetchedImage, Fetcher, FilenameStyle, HttpFetcher};
pub use error::ScrapeError;
pub use log::{LogEntry, LogSummary, RunLog};
pub use policy::{EntryFilter, IdRange, Preset, RunPolicy};
pub use run::{
    JobArtifacts, JobContext, JobEvent, JobOutcome, JobReport, execute_job, run_job,
};
pub use sources::{SourceConfig, build_sources};
