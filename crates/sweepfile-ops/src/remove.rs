//! Removal of previous archive entries.

use std::fs;
use std::io;
use std::path::Path;

/// Remove whatever sits at `path`.
///
/// Directories are removed with all their contents, files and links are
/// unlinked (a link's target is left alone). Returns `Ok(false)` when nothing
/// was there.
pub fn remove_entry(path: &Path) -> io::Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        // Vanished between the stat and the removal.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
