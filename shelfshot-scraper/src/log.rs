use std::fmt;
use std::path::Path;

use shelfshot_core::Provider;

/// How one entry ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A new image was downloaded and assigned.
    Downloaded {
        id: String,
        provider: Provider,
        query: String,
        filename: String,
    },
    /// The entry kept its current image.
    Kept { id: String, reason: String },
    /// The entry was pointed at its placeholder.
    Placeholder { id: String, reason: String },
    /// The entry was not processed.
    Skipped { id: String, reason: String },
    /// Processing failed; the entry may be unresolved.
    Error { id: String, message: String },
}

impl LogEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Downloaded { id, .. }
            | Self::Kept { id, .. }
            | Self::Placeholder { id, .. }
            | Self::Skipped { id, .. }
            | Self::Error { id, .. } => id,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded {
                id,
                provider,
                query,
                filename,
            } => write!(f, "[OK] {} -> {} ({}, \"{}\")", id, filename, provider, query),
            Self::Kept { id, reason } => write!(f, "[KEPT] {}: {}", id, reason),
            Self::Placeholder { id, reason } => write!(f, "[PLACEHOLDER] {}: {}", id, reason),
            Self::Skipped { id, reason } => write!(f, "[SKIPPED] {}: {}", id, reason),
            Self::Error { id, message } => write!(f, "[ERROR] {}: {}", id, message),
        }
    }
}

/// Collects per-entry results and writes the run log file.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    job: String,
    entries: Vec<LogEntry>,
    changed: usize,
    failed_downloads: usize,
}

impl RunLog {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Record that an entry's `image_url` changed.
    pub fn mark_changed(&mut self) {
        self.changed += 1;
    }

    /// Record one failed download attempt.
    pub fn mark_download_failed(&mut self) {
        self.failed_downloads += 1;
    }

    pub fn summary(&self) -> LogSummary {
        let mut summary = LogSummary {
            changed: self.changed,
            failed_downloads: self.failed_downloads,
            ..Default::default()
        };
        for entry in &self.entries {
            match entry {
                LogEntry::Downloaded { .. } => summary.downloaded += 1,
                LogEntry::Kept { .. } => summary.kept += 1,
                LogEntry::Placeholder { .. } => summary.placeholders += 1,
                LogEntry::Skipped { .. } => summary.skipped += 1,
                LogEntry::Error { .. } => summary.errors += 1,
            }
        }
        summary
    }

    /// Write the log to a file.
    pub fn write_to_file(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        let summary = self.summary();

        writeln!(file, "=== Image Run Log: {} ===", self.job)?;
        writeln!(
            file,
            "Date: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;
        writeln!(file, "--- Summary ---")?;
        writeln!(file, "Processed: {}", summary.processed())?;
        writeln!(file, "Changed: {}", summary.changed)?;
        writeln!(file, "Downloaded: {}", summary.downloaded)?;
        writeln!(file, "Kept existing: {}", summary.kept)?;
        writeln!(file, "Placeholders: {}", summary.placeholders)?;
        writeln!(file, "Skipped: {}", summary.skipped)?;
        writeln!(file, "Failed downloads: {}", summary.failed_downloads)?;
        writeln!(file, "Errors: {}", summary.errors)?;
        writeln!(file)?;
        writeln!(file, "--- Details ---")?;
        writeln!(file)?;

        for entry in &self.entries {
            writeln!(file, "{}", entry)?;
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogSummary {
    pub downloaded: usize,
    pub kept: usize,
    pub placeholders: usize,
    pub skipped: usize,
    pub errors: usize,
    pub changed: usize,
    pub failed_downloads: usize,
}

impl LogSummary {
    /// Entries that went through resolution (everything but skips).
    pub fn processed(&self) -> usize {
        self.downloaded + self.kept + self.placeholders + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_kind() {
        let mut log = RunLog::new("remap");
        log.add(LogEntry::Downloaded {
            id: "p1".into(),
            provider: Provider::TagSearch,
            query: "soap".into(),
            filename: "p1.jpg".into(),
        });
        log.add(LogEntry::Placeholder {
            id: "p2".into(),
            reason: "no match".into(),
        });
        log.add(LogEntry::Skipped {
            id: "p3".into(),
            reason: "already resolved".into(),
        });
        log.mark_changed();
        log.mark_changed();
        log.mark_download_failed();

        let summary = log.summary();
        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.placeholders, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.failed_downloads, 1);
        assert_eq!(summary.processed(), 2);
    }

    #[test]
    fn writes_summary_and_details() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("run.log");
        let mut log = RunLog::new("stock");
        log.add(LogEntry::Kept {
            id: "p7".into(),
            reason: "no unique replacement".into(),
        });
        log.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("=== Image Run Log: stock ==="));
        assert!(text.contains("Kept existing: 1"));
        assert!(text.contains("[KEPT] p7: no unique replacement"));
    }
}
