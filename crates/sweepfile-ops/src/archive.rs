//! Replace-then-move into the archive root.

use std::fs;
use std::path::{Path, PathBuf};

use sweepfile_core::{ArchiveLayout, NodeKind, SweepConfig, normalize_path};

use crate::move_op::move_item;
use crate::operation::{ArchiveOutcome, ArchiveStep};
use crate::remove::remove_entry;

/// Moves qualifying nodes into the archive root.
///
/// The archive tree is owned by the mover; nothing else writes there.
#[derive(Debug, Clone)]
pub struct ArchiveMover {
    root_path: PathBuf,
    archive_root: PathBuf,
    layout: ArchiveLayout,
    dry_run: bool,
}

impl ArchiveMover {
    /// Create a mover with the flat layout.
    pub fn new(root_path: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            archive_root: archive_root.into(),
            layout: ArchiveLayout::Flat,
            dry_run: false,
        }
    }

    /// Create a mover matching a sweep configuration.
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(&config.root_path, &config.archive_path)
            .with_layout(config.layout)
            .with_dry_run(config.dry_run)
    }

    /// Set the archive layout.
    pub fn with_layout(mut self, layout: ArchiveLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Enable or disable dry-run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Archive root.
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// Destination of `source` inside the archive.
    ///
    /// With the flat layout only the file name is kept. With the mirrored
    /// layout the path relative to the root is kept; sources outside the root
    /// fall back to the flat placement.
    pub fn destination_for(&self, source: &Path) -> Option<PathBuf> {
        let name = source.file_name()?;
        let dest = match self.layout {
            ArchiveLayout::Flat => self.archive_root.join(name),
            ArchiveLayout::Mirrored => match source.strip_prefix(&self.root_path) {
                Ok(relative) if !relative.as_os_str().is_empty() => {
                    self.archive_root.join(relative)
                }
                _ => self.archive_root.join(name),
            },
        };
        Some(dest)
    }

    /// Archive `source`, replacing any entry of the same name in the archive.
    ///
    /// A destination that is the root or one of its ancestors is refused
    /// before anything is removed. Each sub-step catches its own failure: a
    /// failed removal of the previous entry is logged and the move is still
    /// attempted. Nothing is returned
    /// as an error; inspect the outcome instead.
    pub fn archive_and_replace(&self, source: &Path, kind: NodeKind) -> ArchiveOutcome {
        let mut outcome = ArchiveOutcome::new(source.to_path_buf(), kind);

        let Some(dest) = self.destination_for(source) else {
            tracing::error!("Cannot archive {}: path has no file name", source.display());
            outcome.fail(ArchiveStep::Resolve, source, "path has no file name".to_string());
            return outcome;
        };
        outcome.destination = Some(dest.clone());

        if normalize_path(&self.root_path).starts_with(normalize_path(&dest)) {
            tracing::error!(
                "Refusing to archive {}: destination {} would replace {}",
                source.display(),
                dest.display(),
                self.root_path.display()
            );
            outcome.fail(
                ArchiveStep::Resolve,
                &dest,
                format!("destination contains root {}", self.root_path.display()),
            );
            return outcome;
        }

        if self.dry_run {
            if fs::symlink_metadata(&dest).is_ok() {
                tracing::info!("[dry-run] Would remove from archive: {}", dest.display());
            }
            tracing::info!(
                "[dry-run] Would move {} to archive: {}",
                kind,
                source.display()
            );
            outcome.simulated = true;
            return outcome;
        }

        match remove_entry(&dest) {
            Ok(true) => {
                outcome.replaced = true;
                tracing::info!("Removed from archive: {}", dest.display());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    "Error removing {} from archive: {}",
                    dest.display(),
                    e
                );
                outcome.fail(ArchiveStep::Clear, &dest, e.to_string());
            }
        }

        if self.layout == ArchiveLayout::Mirrored {
            if let Some(parent) = dest.parent() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::error!(
                        "Error creating archive folder {}: {}",
                        parent.display(),
                        e
                    );
                    outcome.fail(ArchiveStep::Move, parent, e.to_string());
                    return outcome;
                }
            }
        }

        match move_item(source, &dest) {
            Ok(()) => {
                outcome.moved = true;
                tracing::info!("{} moved to archive: {}", kind_label(kind), source.display());
            }
            Err(e) => {
                tracing::error!(
                    "Error moving {} {} to archive: {}",
                    kind,
                    source.display(),
                    e
                );
                outcome.fail(ArchiveStep::Move, source, e.to_string());
            }
        }

        outcome
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "File",
        NodeKind::Directory => "Folder",
        NodeKind::Symlink => "Link",
    }
}
