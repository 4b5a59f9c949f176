//! Archive outcome and error types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sweepfile_core::NodeKind;
use thiserror::Error;

/// Sub-step of an archive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveStep {
    /// Computing the destination path.
    Resolve,
    /// Removing the previous entry at the destination.
    Clear,
    /// Moving the source into the archive.
    Move,
}

impl fmt::Display for ArchiveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "resolve"),
            Self::Clear => write!(f, "clear"),
            Self::Move => write!(f, "move"),
        }
    }
}

/// An error that occurred during one archive sub-step.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{step} failed for {}: {message}", .path.display())]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// Sub-step that failed.
    pub step: ArchiveStep,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, step: ArchiveStep, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            step,
            message: message.into(),
        }
    }
}

/// What happened to a single node handed to the archive mover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    /// Source path.
    pub source: PathBuf,
    /// Destination under the archive root, when it could be computed.
    pub destination: Option<PathBuf>,
    /// Kind of the source node.
    pub kind: NodeKind,
    /// A previous archive entry was removed.
    pub replaced: bool,
    /// The source now lives at the destination.
    pub moved: bool,
    /// Nothing was touched because dry-run is enabled.
    pub simulated: bool,
    /// Errors from individual sub-steps.
    pub errors: Vec<OperationError>,
}

impl ArchiveOutcome {
    pub(crate) fn new(source: PathBuf, kind: NodeKind) -> Self {
        Self {
            source,
            destination: None,
            kind,
            replaced: false,
            moved: false,
            simulated: false,
            errors: Vec::new(),
        }
    }

    /// Whether the node was archived (or would have been, in dry-run).
    ///
    /// A failed removal of the previous entry does not count against the node
    /// when the move itself went through.
    pub fn is_success(&self) -> bool {
        self.moved || self.simulated
    }

    pub(crate) fn fail(&mut self, step: ArchiveStep, path: impl Into<PathBuf>, message: String) {
        self.errors.push(OperationError::new(path, step, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::new("/archive/A", ArchiveStep::Clear, "Permission denied");
        assert_eq!(err.to_string(), "clear failed for /archive/A: Permission denied");
    }

    #[test]
    fn test_outcome_success() {
        let mut outcome = ArchiveOutcome::new(PathBuf::from("/root/A"), NodeKind::Directory);
        assert!(!outcome.is_success());

        outcome.fail(ArchiveStep::Clear, "/archive/A", "busy".to_string());
        assert!(!outcome.is_success());

        outcome.moved = true;
        assert!(outcome.is_success());
        assert_eq!(outcome.errors.len(), 1);
    }
}
