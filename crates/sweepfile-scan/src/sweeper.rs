//! Depth-first archival sweep.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

use sweepfile_core::{Clock, DeletionThreshold, FsNode, SweepConfig, SweepError};
use sweepfile_ops::ArchiveMover;

use crate::report::SweepReport;

/// Runs one archival pass over the configured folders.
#[derive(Debug, Clone)]
pub struct Sweeper {
    config: Arc<SweepConfig>,
    threshold: DeletionThreshold,
    mover: ArchiveMover,
}

impl Sweeper {
    /// Create a sweeper that reads the system clock.
    pub fn new(config: Arc<SweepConfig>) -> Self {
        let threshold = DeletionThreshold::new(config.frequency_days);
        let mover = ArchiveMover::from_config(&config);
        Self {
            config,
            threshold,
            mover,
        }
    }

    /// Create a sweeper with a custom clock.
    pub fn with_clock(config: Arc<SweepConfig>, clock: Arc<dyn Clock>) -> Self {
        let threshold = DeletionThreshold::with_clock(config.frequency_days, clock);
        Self {
            threshold,
            ..Self::new(config)
        }
    }

    /// Configuration this sweeper runs with.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Sweep every configured folder.
    pub fn sweep(&self) -> Result<SweepReport, SweepError> {
        self.sweep_with_cancel(&CancellationToken::new())
    }

    /// Sweep every configured folder, stopping between nodes once `cancel`
    /// fires.
    ///
    /// A stat or listing failure aborts the whole sweep, including the
    /// folders not reached yet. Archive failures are per node and only
    /// counted in the report.
    pub fn sweep_with_cancel(&self, cancel: &CancellationToken) -> Result<SweepReport, SweepError> {
        let start = Instant::now();
        let mut report = SweepReport::default();

        if !self.config.dry_run {
            let archive_root = self.mover.archive_root();
            fs::create_dir_all(archive_root).map_err(|source| SweepError::ArchiveRoot {
                path: archive_root.to_path_buf(),
                source,
            })?;
        }
        self.check_overlap()?;

        tracing::info!(
            "Sweeping {} folder(s) under {} (threshold: {} days)",
            self.config.folder_names.len(),
            self.config.root_path.display(),
            self.threshold.days()
        );

        for folder in self.config.folder_paths() {
            tracing::debug!("Sweeping {}", folder.display());
            self.sweep_folder(&folder, cancel, &mut report)?;
        }

        report.duration = start.elapsed();
        tracing::info!("Sweep finished: {}", report.summary());
        Ok(report)
    }

    /// Walk one top-level folder depth-first, in file name order.
    ///
    /// The folder itself is resolved if it is a link; links below it are
    /// evaluated but never descended into, so a link cycle cannot loop the
    /// sweep. A qualifying directory is archived and its contents skipped.
    fn sweep_folder(
        &self,
        folder: &Path,
        cancel: &CancellationToken,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        let mut entries = WalkDir::new(folder)
            .follow_links(false)
            .follow_root_links(true)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = entry.map_err(walk_error)?;
            if cancel.is_cancelled() {
                tracing::warn!("Sweep cancelled before {}", entry.path().display());
                return Err(SweepError::Cancelled);
            }

            let node = inspect(&entry)?;
            report.examined += 1;

            if self.threshold.is_older_than_threshold(node.modified) {
                let outcome = self.mover.archive_and_replace(&node.path, node.kind);
                report.record(outcome);
                if node.kind.is_dir() {
                    entries.skip_current_dir();
                }
            }
        }

        Ok(())
    }

    /// Refuse to run when root and archive overlap once links are resolved.
    fn check_overlap(&self) -> Result<(), SweepError> {
        let (Ok(root), Ok(archive)) = (
            fs::canonicalize(&self.config.root_path),
            fs::canonicalize(self.mover.archive_root()),
        ) else {
            return Ok(());
        };
        if root.starts_with(&archive) || archive.starts_with(&root) {
            return Err(SweepError::ArchiveOverlap { root, archive });
        }
        Ok(())
    }
}

/// Stat a walked entry. Only the configured folder itself follows links.
fn inspect(entry: &DirEntry) -> Result<FsNode, SweepError> {
    let path = entry.path();
    let node = if entry.depth() == 0 {
        FsNode::stat_followed(path)
    } else {
        FsNode::stat(path)
    };
    node.map_err(|e| SweepError::io(path, e))
}

/// Map a walk failure, keeping the I/O error kind for missing or locked paths.
fn walk_error(err: walkdir::Error) -> SweepError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    SweepError::io(path, io::Error::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepfile_core::NodeKind;
    use tempfile::TempDir;

    #[test]
    fn test_walk_error_keeps_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let err = WalkDir::new(&missing)
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();

        let err = walk_error(err);
        assert!(matches!(err, SweepError::NotFound { ref path } if *path == missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_inspect_follows_only_the_root() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir_all(real.join("inner")).unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("top")).unwrap();
        std::os::unix::fs::symlink(real.join("inner"), real.join("nested")).unwrap();

        let kinds: Vec<_> = WalkDir::new(dir.path().join("top"))
            .follow_links(false)
            .follow_root_links(true)
            .sort_by_file_name()
            .into_iter()
            .map(|e| inspect(&e.unwrap()).unwrap().kind)
            .collect();

        assert_eq!(
            kinds,
            vec![NodeKind::Directory, NodeKind::Directory, NodeKind::Symlink]
        );
    }
}
