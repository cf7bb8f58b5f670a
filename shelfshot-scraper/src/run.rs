//! The job orchestrator.
//!
//! One job walks the selected catalog entries strictly in order. For each
//! entry it searches the policy's sources, downloads the best candidate
//! that is not already in use, and falls back to the entry's current image
//! or a placeholder, so every processed entry ends with an `image_url`.
//! The catalog is only changed in memory; [`execute_job`] wraps a job with
//! the load, backup and single final save.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use shelfshot_core::util::{is_placeholder_filename, local_filename, public_url, sha256_hex};
use shelfshot_core::{CatalogEntry, EntryState, ImageSource, Provider, SearchRequest};
use shelfshot_lib::backup::{self, BackupTarget};
use shelfshot_lib::dedup::duplicate_groups;
use shelfshot_lib::mapping::{MappingRow, append_rows};
use shelfshot_lib::placeholder::ensure_placeholder;
use shelfshot_lib::{Catalog, CatalogStore, DedupIndex, ScoreWeights, Selector, UsedImages};
use tokio::sync::mpsc;

use crate::download::{
    Fetcher, StoredImage, check_size, extension_for, image_filename, store_image,
};
use crate::error::ScrapeError;
use crate::log::{LogEntry, RunLog};
use crate::policy::{Preset, RunPolicy};

/// Shared inputs for a job: adapters, the downloader and local paths.
pub struct JobContext<'a> {
    /// Sources in the policy's provider order.
    pub sources: &'a [Box<dyn ImageSource>],
    pub fetcher: &'a dyn Fetcher,
    pub image_dir: PathBuf,
    /// URL prefix the storefront serves `image_dir` under.
    pub public_prefix: String,
    pub weights: ScoreWeights,
    /// Downloads below this size are rejected.
    pub min_bytes: u64,
    /// Pause before retrying a query that came back empty.
    pub retry_pause: Duration,
    /// `?v=` stamp for new image URLs.
    pub cache_bust: Option<String>,
    /// Where an image about to be overwritten is copied first.
    pub image_backup_dir: Option<PathBuf>,
}

/// Progress events emitted during a job, consumed by the CLI.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Entry selection done.
    Started { total: usize },
    /// An entry has started processing.
    EntryStarted { index: usize, id: String },
    /// An entry moved to a new state.
    StateChanged {
        index: usize,
        id: String,
        state: EntryState,
    },
    /// An entry is resolved (or skipped, or failed).
    EntryFinished { index: usize, record: LogEntry },
    /// All entries processed.
    Done,
}

/// Result of a job: the updated catalog plus its audit trail.
#[derive(Debug)]
pub struct JobOutcome {
    pub catalog: Catalog,
    pub rows: Vec<MappingRow>,
    pub log: RunLog,
    /// URLs and digests claimed so far, for a follow-up job in this process.
    pub used: UsedImages,
}

/// How an entry's search ended.
enum Found {
    Accepted {
        stored: StoredImage,
        provider: Provider,
        query: String,
        url: String,
    },
    Nothing {
        saw_candidate: bool,
        last_failure: Option<String>,
    },
}

/// Why a chosen candidate was not used.
enum Rejection {
    Duplicate,
    Failed(String),
}

struct Job<'a, 'p> {
    policy: &'p RunPolicy,
    ctx: &'p JobContext<'a>,
    selector: Selector,
    index: DedupIndex,
    /// Local filename -> ids of the entries whose `image_url` names it.
    file_refs: HashMap<String, HashSet<String>>,
    used: UsedImages,
    log: RunLog,
    rows: Vec<MappingRow>,
    events: mpsc::UnboundedSender<JobEvent>,
}

/// Run `policy` over an in-memory catalog.
///
/// Per-entry failures are recorded in the log and mapping rows and never
/// abort the job. The only errors returned are setup failures (the image
/// directory cannot be read).
pub async fn run_job(
    catalog: Catalog,
    policy: &RunPolicy,
    ctx: &JobContext<'_>,
    used: UsedImages,
    events: mpsc::UnboundedSender<JobEvent>,
) -> Result<JobOutcome, ScrapeError> {
    let mut weights = ctx.weights.clone();
    if let Some(min) = policy.min_score {
        weights.min_score = min;
    }
    let selector = Selector::new(weights, policy.selection).with_required_keywords(policy.require_keywords);

    let index = DedupIndex::scan_dir(&ctx.image_dir)?;
    log::debug!(
        "{}: {} images indexed, {} sources",
        policy.preset,
        index.len(),
        ctx.sources.len()
    );

    let mut file_refs: HashMap<String, HashSet<String>> = HashMap::new();
    for entry in catalog.entries() {
        if let Some(file) = entry
            .current_image()
            .and_then(|url| local_filename(url, &ctx.public_prefix))
        {
            file_refs
                .entry(file.to_string())
                .or_default()
                .insert(entry.id.clone());
        }
    }

    let mut job = Job {
        policy,
        ctx,
        selector,
        index,
        file_refs,
        used,
        log: RunLog::new(policy.preset.short_name()),
        rows: Vec::new(),
        events,
    };

    let mut catalog = catalog;
    if policy.preset == Preset::Dedup {
        job.dedup_pass(&mut catalog).await;
    } else {
        job.map_pass(&mut catalog).await;
    }
    let _ = job.events.send(JobEvent::Done);

    Ok(JobOutcome {
        catalog,
        rows: job.rows,
        log: job.log,
        used: job.used,
    })
}

impl Job<'_, '_> {
    fn emit(&self, index: usize, id: &str, state: EntryState) {
        let _ = self.events.send(JobEvent::StateChanged {
            index,
            id: id.to_string(),
            state,
        });
    }

    /// Local filename the entry currently points at, if any.
    fn current_file<'e>(&self, entry: &'e CatalogEntry) -> Option<&'e str> {
        entry
            .current_image()
            .and_then(|url| local_filename(url, &self.ctx.public_prefix))
    }

    /// Whether an entry other than `id` points at `filename`.
    fn shared_with_others(&self, filename: &str, id: &str) -> bool {
        self.file_refs
            .get(filename)
            .is_some_and(|ids| ids.iter().any(|other| other != id))
    }

    /// Move `id` from the file `old_url` names to the one `new_url` names.
    fn repoint(&mut self, id: &str, old_url: Option<&str>, new_url: &str) {
        let prefix = &self.ctx.public_prefix;
        if let Some(old) = old_url.and_then(|u| local_filename(u, prefix)) {
            if let Some(ids) = self.file_refs.get_mut(old) {
                ids.remove(id);
            }
        }
        if let Some(new) = local_filename(new_url, prefix) {
            self.file_refs
                .entry(new.to_string())
                .or_default()
                .insert(id.to_string());
        }
    }

    /// `preferred`, or `<stem>_<n>.<ext>` when another entry already points
    /// at `preferred`. Files no entry references may be overwritten.
    fn target_filename(&self, preferred: String, id: &str) -> String {
        if !self.shared_with_others(&preferred, id) {
            return preferred;
        }
        let (stem, ext) = preferred
            .rsplit_once('.')
            .map(|(s, e)| (s.to_string(), e.to_string()))
            .unwrap_or_else(|| (preferred.clone(), "jpg".to_string()));
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}.{}", stem, n, ext);
            if !self.shared_with_others(&candidate, id)
                && !self.ctx.image_dir.join(&candidate).exists()
            {
                log::debug!("{}: {} belongs to another entry, using {}", id, preferred, candidate);
                return candidate;
            }
            n += 1;
        }
    }

    /// A real (non-placeholder) local image that exists on disk.
    fn has_resolved_image(&self, entry: &CatalogEntry) -> bool {
        self.current_file(entry)
            .is_some_and(|f| !is_placeholder_filename(f) && self.ctx.image_dir.join(f).is_file())
    }

    async fn map_pass(&mut self, catalog: &mut Catalog) {
        let mut selected: Vec<usize> = Vec::new();
        for (i, entry) in catalog.entries().iter().enumerate() {
            if !self.policy.filter.matches(entry) {
                continue;
            }
            if !self.policy.force && self.has_resolved_image(entry) {
                log::debug!("{}: already has an image, skipping", entry.id);
                self.log.add(LogEntry::Skipped {
                    id: entry.id.clone(),
                    reason: "already has an image".into(),
                });
                continue;
            }
            selected.push(i);
        }
        if let Some(n) = self.policy.sample {
            selected.truncate(n);
        }

        let total = selected.len();
        let _ = self.events.send(JobEvent::Started { total });
        log::info!("{}: processing {} entries", self.policy.preset, total);

        for (n, i) in selected.into_iter().enumerate() {
            let entry = catalog.entries()[i].clone();
            let own = self.current_file(&entry).map(str::to_string);
            if let Some(url) = self.process(n, &entry, own.as_deref(), "no match").await {
                catalog.set_image_url(&entry.id, url);
            }
        }
    }

    async fn dedup_pass(&mut self, catalog: &mut Catalog) {
        let groups = duplicate_groups(catalog.entries(), &self.index, &self.ctx.public_prefix);
        let mut selected: Vec<String> = Vec::new();
        for group in &groups {
            log::info!(
                "{} entries share {}..., keeping {}",
                group.entry_ids().len(),
                group.short_digest(),
                group.keeper()
            );
            for id in group.others() {
                if catalog.get(id).is_some_and(|e| self.policy.filter.matches(e)) {
                    selected.push(id.clone());
                }
            }
        }
        if let Some(n) = self.policy.sample {
            selected.truncate(n);
        }

        let total = selected.len();
        let _ = self.events.send(JobEvent::Started { total });
        log::info!("dedup: {} groups, {} entries to replace", groups.len(), total);

        for (n, id) in selected.into_iter().enumerate() {
            let Some(entry) = catalog.get(&id).cloned() else {
                continue;
            };
            // The shared file belongs to the keeper, so no file is exempt
            // from the uniqueness check here.
            if let Some(url) = self.process(n, &entry, None, "no unique replacement").await {
                catalog.set_image_url(&entry.id, url);
            }
        }
    }

    /// Resolve one entry. Returns the new `image_url` if it changed.
    async fn process(
        &mut self,
        n: usize,
        entry: &CatalogEntry,
        own_file: Option<&str>,
        no_match_note: &str,
    ) -> Option<String> {
        let _ = self.events.send(JobEvent::EntryStarted {
            index: n,
            id: entry.id.clone(),
        });
        self.emit(n, &entry.id, EntryState::Pending);

        let queries = self.policy.queries_for(entry);
        let before = entry.image_url.clone();

        let (record, row, new_url) = match self.search_and_download(n, entry, &queries, own_file).await {
            Found::Accepted {
                stored,
                provider,
                query,
                url,
            } => {
                let new_url = public_url(
                    &self.ctx.public_prefix,
                    &stored.filename,
                    self.ctx.cache_bust.as_deref(),
                );
                log::info!("{}: {} from {}", entry.id, stored.filename, provider);
                let row = MappingRow {
                    query: query.clone(),
                    chosen_source: provider.short_name().to_string(),
                    chosen_url: url,
                    filename: stored.filename.clone(),
                    sha256: stored.sha256.clone(),
                    ..MappingRow::new(&entry.id)
                };
                let record = LogEntry::Downloaded {
                    id: entry.id.clone(),
                    provider,
                    query,
                    filename: stored.filename,
                };
                (record, row, Some(new_url))
            }
            Found::Nothing {
                saw_candidate,
                last_failure,
            } => {
                self.emit(n, &entry.id, EntryState::NoCandidate);
                let note = match (saw_candidate, last_failure) {
                    (true, Some(why)) => format!("{} (last: {})", no_match_note, why),
                    _ => no_match_note.to_string(),
                };
                self.fall_back(entry, &queries, note)
            }
        };

        if new_url.is_some() || matches!(record, LogEntry::Kept { .. }) {
            self.emit(n, &entry.id, EntryState::Resolved);
        }

        let changed = new_url.is_some() && new_url != before;
        if changed {
            if let Some(url) = new_url.as_deref() {
                self.repoint(&entry.id, before.as_deref(), url);
            }
        }
        let kept = matches!(record, LogEntry::Kept { .. });
        if changed || (kept && self.policy.count_kept_as_changed) {
            self.log.mark_changed();
        }

        self.rows.push(row);
        self.log.add(record.clone());
        let _ = self.events.send(JobEvent::EntryFinished { index: n, record });
        new_url.filter(|_| changed)
    }

    /// Walk sources and queries until a candidate is downloaded and accepted.
    async fn search_and_download(
        &mut self,
        n: usize,
        entry: &CatalogEntry,
        queries: &[String],
        own_file: Option<&str>,
    ) -> Found {
        let ctx = self.ctx;
        let mut saw_candidate = false;
        let mut last_failure: Option<String> = None;
        // Sources may return the same URL for every query
        let mut tried: HashSet<String> = HashSet::new();

        for source in ctx.sources {
            let provider = source.provider();
            for (qi, query) in queries.iter().enumerate() {
                self.emit(n, &entry.id, EntryState::Searching);
                let request = SearchRequest {
                    query,
                    entry,
                    max_results: self.policy.max_results,
                };

                let mut candidates = source.search(&request).await;
                let mut attempt = 1;
                while candidates.is_empty() && qi == 0 && attempt < self.policy.attempts_per_query {
                    log::debug!(
                        "{}: no results for '{}' from {}, retrying in {:?}",
                        entry.id,
                        query,
                        provider,
                        ctx.retry_pause
                    );
                    tokio::time::sleep(ctx.retry_pause).await;
                    candidates = source.search(&request).await;
                    attempt += 1;
                }

                let shortlist = self.selector.shortlist(entry, &candidates, &self.used);
                if shortlist.is_empty() {
                    continue;
                }
                saw_candidate = true;
                self.emit(n, &entry.id, EntryState::CandidateFound);

                for scored in shortlist {
                    let url = scored.candidate.url;
                    if !tried.insert(url.clone()) {
                        continue;
                    }
                    self.emit(n, &entry.id, EntryState::Downloading);
                    match self.try_download(entry, &url, provider, own_file).await {
                        Ok(stored) => {
                            self.emit(n, &entry.id, EntryState::Accepted);
                            let query = if provider == Provider::Manual {
                                url.clone()
                            } else {
                                query.clone()
                            };
                            return Found::Accepted {
                                stored,
                                provider,
                                query,
                                url,
                            };
                        }
                        Err(Rejection::Duplicate) => {
                            self.emit(n, &entry.id, EntryState::DuplicateRejected);
                            log::debug!("{}: {} duplicates an existing image", entry.id, url);
                            last_failure = Some("duplicate".to_string());
                        }
                        Err(Rejection::Failed(why)) => {
                            self.emit(n, &entry.id, EntryState::DownloadFailed);
                            log::warn!("{}: download failed: {}", entry.id, why);
                            self.log.mark_download_failed();
                            last_failure = Some(why);
                        }
                    }
                }
            }
        }

        Found::Nothing {
            saw_candidate,
            last_failure,
        }
    }

    /// Fetch, verify and store one candidate.
    ///
    /// Nothing is written for undersized payloads or duplicates.
    async fn try_download(
        &mut self,
        entry: &CatalogEntry,
        url: &str,
        provider: Provider,
        own_file: Option<&str>,
    ) -> Result<StoredImage, Rejection> {
        let fetched = self
            .ctx
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| Rejection::Failed(e.to_string()))?;
        check_size(&fetched, self.ctx.min_bytes, url).map_err(|e| Rejection::Failed(e.to_string()))?;

        let digest = sha256_hex(&fetched.bytes);
        // A file other entries also point at is not this entry's to re-use
        let own_file = own_file.filter(|f| !self.shared_with_others(f, &entry.id));
        if self.policy.dedup
            && (self.used.has_digest(&digest) || self.index.is_taken(&digest, own_file))
        {
            self.used.mark_url(url);
            return Err(Rejection::Duplicate);
        }

        let ext = extension_for(fetched.content_type.as_deref(), &fetched.final_url);
        let filename = self.target_filename(
            image_filename(self.policy.filename_style, provider, &entry.id, ext),
            &entry.id,
        );
        let target = self.ctx.image_dir.join(&filename);
        if target.is_file() {
            if let Some(dir) = &self.ctx.image_backup_dir {
                backup::backup_image(&target, dir).map_err(|e| {
                    Rejection::Failed(format!("could not back up {}: {}", filename, e))
                })?;
            }
        }

        let stored = store_image(&self.ctx.image_dir, &filename, &fetched.bytes, &digest)
            .map_err(|e| Rejection::Failed(e.to_string()))?;
        self.index.insert(&stored.filename, &digest);
        self.used.mark_url(url);
        self.used.mark_digest(&digest);
        Ok(stored)
    }

    /// Resolve an entry without a new download: keep its current image
    /// (keep-existing policy) or point it at its placeholder.
    fn fall_back(
        &mut self,
        entry: &CatalogEntry,
        queries: &[String],
        note: String,
    ) -> (LogEntry, MappingRow, Option<String>) {
        let query = queries.first().cloned().unwrap_or_default();

        if self.policy.keep_existing_on_no_match && self.has_resolved_image(entry) {
            let filename = self.current_file(entry).unwrap_or_default().to_string();
            log::info!("{}: {}, kept {}", entry.id, note, filename);
            let row = MappingRow {
                query,
                chosen_source: "existing".to_string(),
                chosen_url: entry.current_image().unwrap_or_default().to_string(),
                sha256: self.index.digest_of(&filename).unwrap_or_default().to_string(),
                filename,
                notes: note.clone(),
                ..MappingRow::new(&entry.id)
            };
            let record = LogEntry::Kept {
                id: entry.id.clone(),
                reason: note,
            };
            return (record, row, entry.image_url.clone());
        }

        match ensure_placeholder(&self.ctx.image_dir, entry) {
            Ok(placeholder) => {
                log::info!("{}: {}, using {}", entry.id, note, placeholder.filename);
                let url = public_url(&self.ctx.public_prefix, &placeholder.filename, None);
                let row = MappingRow {
                    query,
                    chosen_source: "placeholder".to_string(),
                    filename: placeholder.filename.clone(),
                    notes: note.clone(),
                    ..MappingRow::new(&entry.id)
                };
                let record = LogEntry::Placeholder {
                    id: entry.id.clone(),
                    reason: note,
                };
                (record, row, Some(url))
            }
            Err(e) => {
                let message = format!("placeholder failed: {}", e);
                log::error!("{}: {}", entry.id, message);
                let row = MappingRow {
                    query,
                    notes: format!("error: {}", message),
                    ..MappingRow::new(&entry.id)
                };
                let record = LogEntry::Error {
                    id: entry.id.clone(),
                    message,
                };
                (record, row, None)
            }
        }
    }
}

/// Where a job writes its artifacts.
#[derive(Debug, Clone)]
pub struct JobArtifacts {
    pub artifacts_dir: PathBuf,
}

impl JobArtifacts {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.artifacts_dir.join("backups")
    }

    pub fn mapping_csv(&self, policy: &RunPolicy) -> PathBuf {
        self.artifacts_dir.join(&policy.mapping_csv)
    }

    pub fn run_log(&self, policy: &RunPolicy, stamp: &str) -> PathBuf {
        self.artifacts_dir
            .join("logs")
            .join(format!("{}-{}.log", policy.preset.short_name(), stamp))
    }
}

/// A finished job and where its artifacts went.
#[derive(Debug)]
pub struct JobReport {
    pub outcome: JobOutcome,
    pub backup: PathBuf,
    pub mapping_csv: PathBuf,
    pub log_file: PathBuf,
}

/// Load the catalog, back it up, run the job, then save the catalog once and
/// write the mapping CSV and run log.
///
/// A missing or invalid catalog fails before anything is written.
pub async fn execute_job(
    store: &CatalogStore,
    artifacts: &JobArtifacts,
    policy: &RunPolicy,
    ctx: &JobContext<'_>,
    used: UsedImages,
    events: mpsc::UnboundedSender<JobEvent>,
) -> Result<JobReport, ScrapeError> {
    let catalog = store.load()?;

    let target = match &policy.backup_suffix {
        Some(suffix) => BackupTarget::Suffix(suffix.clone()),
        None => BackupTarget::Timestamped {
            dir: artifacts.backups_dir(),
        },
    };
    let backup = backup::backup_catalog(store.path(), &target)?;

    let outcome = run_job(catalog, policy, ctx, used, events).await?;

    store.save(&outcome.catalog)?;

    let mapping_csv = artifacts.mapping_csv(policy);
    append_rows(&mapping_csv, &outcome.rows)?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_file = artifacts.run_log(policy, &stamp);
    outcome.log.write_to_file(&log_file)?;

    Ok(JobReport {
        outcome,
        backup,
        mapping_csv,
        log_file,
    })
}

/// Stamp for cache-busting query strings, one per job.
pub fn cache_bust_stamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
#[path = "tests/run_tests.rs"]
mod tests;
