//! Per-sweep statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sweepfile_core::NodeKind;
use sweepfile_ops::{ArchiveOutcome, OperationError};

/// Counters collected during one sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Nodes checked against the threshold.
    pub examined: u64,
    /// Folders archived as a whole.
    pub archived_dirs: u64,
    /// Files and links archived.
    pub archived_files: u64,
    /// Archive entries replaced by a newer copy.
    pub replaced: u64,
    /// Nodes whose archive attempt failed.
    pub failed: u64,
    /// Errors raised by archive sub-steps.
    pub errors: Vec<OperationError>,
    /// Wall time of the sweep.
    pub duration: Duration,
}

impl SweepReport {
    /// Total number of archived nodes.
    pub fn total_archived(&self) -> u64 {
        self.archived_dirs + self.archived_files
    }

    pub(crate) fn record(&mut self, outcome: ArchiveOutcome) {
        if outcome.replaced {
            self.replaced += 1;
        }
        if outcome.is_success() {
            match outcome.kind {
                NodeKind::Directory => self.archived_dirs += 1,
                NodeKind::File | NodeKind::Symlink => self.archived_files += 1,
            }
        } else {
            self.failed += 1;
        }
        self.errors.extend(outcome.errors);
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} examined, {} folders and {} files archived, {} replaced, {} failed in {:.2}s",
            self.examined,
            self.archived_dirs,
            self.archived_files,
            self.replaced,
            self.failed,
            self.duration.as_secs_f64()
        )
    }
}
