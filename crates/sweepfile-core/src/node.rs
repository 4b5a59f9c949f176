//! Transient views of filesystem entries met during a sweep.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Type of filesystem node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Regular file (or anything that is neither a directory nor a link).
    File,
    /// Directory.
    Directory,
    /// Symbolic link below a configured folder. Never descended into.
    Symlink,
}

impl NodeKind {
    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Check if this is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, NodeKind::Symlink)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "folder"),
            Self::Symlink => write!(f, "link"),
        }
    }
}

impl From<fs::FileType> for NodeKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }
}

/// A single file or directory as seen at the moment it was checked.
///
/// Nodes are produced on demand and never cached across sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsNode {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
    /// Node type.
    pub kind: NodeKind,
}

impl FsNode {
    /// Create a node from already known parts.
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            modified,
            kind,
        }
    }

    /// Query the filesystem for `path`.
    ///
    /// The kind comes from the entry itself, so a link is reported as
    /// [`NodeKind::Symlink`]. The timestamp follows the link when its target
    /// exists and falls back to the link's own time otherwise.
    pub fn stat(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let link_meta = fs::symlink_metadata(path)?;
        let kind = NodeKind::from(link_meta.file_type());

        let modified = if kind.is_symlink() {
            match fs::metadata(path) {
                Ok(target) => target.modified()?,
                Err(_) => link_meta.modified()?,
            }
        } else {
            link_meta.modified()?
        };

        Ok(Self::new(path, modified, kind))
    }

    /// Query the filesystem for `path`, resolving links.
    ///
    /// Used for the configured top-level folders, which may be links to the
    /// real folders. A broken link is an error.
    pub fn stat_followed(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path)?;
        Ok(Self::new(path, meta.modified()?, NodeKind::from(meta.file_type())))
    }

    /// Final path component, if any.
    pub fn name(&self) -> Option<&std::ffi::OsStr> {
        self.path.file_name()
    }
}
