//! Age-based cleanup of extraction output.
//!
//! [`RetentionSweeper`] deletes extraction directories older than the
//! retention window. It can optionally age out downloaded archives too.
//! [`spawn_retention_task`] runs it on a fixed interval until cancelled.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rarstream_common::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Counts from a single sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub retained: usize,
    pub failed: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.removed += other.removed;
        self.retained += other.retained;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

/// Removes aged entries beneath the storage roots.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    extract_root: PathBuf,
    download_root: Option<PathBuf>,
    max_age: Duration,
}

impl RetentionSweeper {
    pub fn new(extract_root: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            extract_root: extract_root.into(),
            download_root: None,
            max_age,
        }
    }

    /// Also remove downloaded archive files older than the window.
    pub fn with_download_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.download_root = Some(root.into());
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let sweeper = Self::new(
            config.storage.extract_dir.clone(),
            config.retention.max_age(),
        );
        if config.retention.sweep_downloads {
            sweeper.with_download_root(config.storage.download_dir.clone())
        } else {
            sweeper
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Run one pass using the current time.
    pub async fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(SystemTime::now()).await
    }

    /// Run one pass, measuring ages against `now`.
    ///
    /// Only an unreadable extraction root is an error. Failures on single
    /// entries are logged, counted in [`SweepReport::failed`], and skipped.
    pub async fn sweep_at(&self, now: SystemTime) -> Result<SweepReport> {
        let mut report = self
            .sweep_root(&self.extract_root, EntryKind::Directory, now)
            .await?;

        if let Some(download_root) = &self.download_root {
            match self.sweep_root(download_root, EntryKind::File, now).await {
                Ok(downloads) => report.merge(downloads),
                Err(e) => {
                    tracing::warn!(root = %download_root.display(), "Failed to sweep downloads: {e}");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            removed = report.removed,
            retained = report.retained,
            failed = report.failed,
            "Retention sweep complete"
        );
        Ok(report)
    }

    async fn sweep_root(&self, root: &Path, kind: EntryKind, now: SystemTime) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut entries = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(root = %root.display(), "Retention root does not exist");
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to stat entry: {e}");
                    report.failed += 1;
                    continue;
                }
            };

            let matches_kind = match kind {
                EntryKind::Directory => metadata.is_dir(),
                EntryKind::File => metadata.is_file(),
            };
            if !matches_kind {
                continue;
            }

            let Some(born) = metadata.created().or_else(|_| metadata.modified()).ok() else {
                tracing::warn!(path = %path.display(), "No timestamp available");
                report.failed += 1;
                continue;
            };

            // A timestamp in the future counts as age zero.
            let age = now.duration_since(born).unwrap_or_default();
            if age <= self.max_age {
                report.retained += 1;
                continue;
            }

            let removal = match kind {
                EntryKind::Directory => tokio::fs::remove_dir_all(&path).await,
                EntryKind::File => tokio::fs::remove_file(&path).await,
            };

            match removal {
                Ok(()) => {
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "Removed expired entry");
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to remove expired entry: {e}");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Spawn a background task that sweeps every `period` until `cancel` fires.
///
/// The first sweep runs one full period after start.
pub fn spawn_retention_task(
    sweeper: RetentionSweeper,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = sweeper.sweep().await {
                        tracing::error!("Retention sweep failed: {e}");
                    }
                }
            }
        }

        tracing::debug!("Retention task stopped");
    })
}
