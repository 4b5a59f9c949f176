//! Move with replace-on-conflict.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::remove::remove_entry;

/// Move a single item (file, directory or link) to `dest`.
///
/// If `dest` is occupied when the rename happens, it is cleared and the
/// rename retried once. Renames across filesystems fall back to copy and
/// delete.
pub fn move_item(source: &Path, dest: &Path) -> io::Result<()> {
    // Moving a directory into itself
    if dest.starts_with(source) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "cannot move {} into its own subtree {}",
                source.display(),
                dest.display()
            ),
        ));
    }

    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_destination_conflict(&e) => {
            tracing::debug!(
                "Destination {} reappeared, replacing it",
                dest.display()
            );
            remove_entry(dest)?;
            fs::rename(source, dest)
        }
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            remove_entry(dest)?;
            copy_then_remove(source, dest)
        }
        Err(e) => Err(e),
    }
}

fn is_destination_conflict(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::AlreadyExists
            | io::ErrorKind::DirectoryNotEmpty
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::NotADirectory
    )
}

/// Cross-filesystem move: copy everything, then delete the source.
///
/// A copy that fails partway is removed again so no partial tree is left in
/// the archive.
fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    let is_dir = fs::symlink_metadata(source)?.is_dir();
    let copied = if is_dir {
        copy_dir_recursive(source, dest)
    } else {
        copy_leaf(source, dest)
    };

    if let Err(e) = copied {
        tracing::error!(
            "Copy of {} to {} failed, removing partial copy: {}",
            source.display(),
            dest.display(),
            e
        );
        if let Err(cleanup) = remove_entry(dest) {
            tracing::error!(
                "Partial copy {} could not be removed: {}",
                dest.display(),
                cleanup
            );
        }
        return Err(e);
    }

    if is_dir {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    }
}

/// Recursively copy a directory without following links.
fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_leaf(entry.path(), &target)?;
        }
    }

    // Keep the folder's age in the archive, best effort.
    let modified = fs::metadata(source)?.modified()?;
    if let Err(e) = fs::File::open(dest).and_then(|dir| dir.set_modified(modified)) {
        tracing::debug!("Could not keep timestamp of {}: {}", dest.display(), e);
    }
    Ok(())
}

/// Copy a file, recreating links as links on unix.
fn copy_leaf(source: &Path, dest: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        if fs::symlink_metadata(source)?.file_type().is_symlink() {
            let target = fs::read_link(source)?;
            return std::os::unix::fs::symlink(target, dest);
        }
    }

    fs::copy(source, dest).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("old.txt");
        let dest = dir.path().join("moved.txt");
        fs::write(&source, b"payload").unwrap();

        move_item(&source, &dest).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn test_move_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("new.txt");
        let dest = dir.path().join("dest.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        move_item(&source, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_move_replaces_non_empty_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("fresh.txt"), b"x").unwrap();
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("stale.txt"), b"x").unwrap();

        move_item(&source, &dest).unwrap();
        assert!(!source.exists());
        assert!(dest.join("fresh.txt").exists());
        assert!(!dest.join("stale.txt").exists());
    }

    #[test]
    fn test_move_into_itself_fails() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("A");
        fs::create_dir(&source).unwrap();

        let err = move_item(&source, &source.join("A")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(source.exists());
    }

    #[test]
    fn test_copy_then_remove_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("copy");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("nested/file.txt"), b"data").unwrap();

        copy_then_remove(&source, &dest).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read(dest.join("nested/file.txt")).unwrap(), b"data");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_partial_tree() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("copy");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::write(source.join("a/readable.txt"), b"data").unwrap();
        let locked = source.join("b.txt");
        fs::write(&locked, b"secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still read the file; nothing to check then.
        if fs::File::open(&locked).is_ok() {
            return;
        }

        let err = copy_then_remove(&source, &dest).unwrap_err();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!dest.exists());
        assert!(source.join("a/readable.txt").exists());
        assert!(locked.exists());
    }
}
