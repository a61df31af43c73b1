//! Abstract filesystem capability consumed by the action executor.
//!
//! The executor never touches `std::fs` directly: all mutation goes through
//! `FsOps`, so dry-run purity can be proven with a recording mock and the
//! engine stays testable without a real disk.

use std::fs;
use std::path::Path;

use crate::core::errors::{FqhError, Result};

/// Mutating filesystem operations used by the sweep.
pub trait FsOps: Send + Sync {
    /// Shrink a file in place to exactly `len` bytes.
    fn truncate(&self, path: &Path, len: u64) -> Result<()>;

    /// Relocate a file. Must be atomic within one volume; across volumes the
    /// source may only disappear after the copy is verified complete.
    fn move_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Remove a single file.
    fn delete(&self, path: &Path) -> Result<()>;

    /// Create a directory and all missing ancestors.
    fn mkdir_all(&self, path: &Path) -> Result<()>;

    /// Restrict permissions to owner-read + group-read, no write, no world.
    fn set_read_only(&self, path: &Path) -> Result<()>;

    /// Remove empty directories under `root`, leaves first, never removing
    /// `root` itself. Returns the number of directories pruned.
    fn remove_empty_dirs(&self, root: &Path) -> Result<usize>;
}

/// Production implementation over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FsOps for RealFs {
    fn truncate(&self, path: &Path, len: u64) -> Result<()> {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| FqhError::io(path, e))?;
        file.set_len(len).map_err(|e| FqhError::io(path, e))
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            // Rename fails across volumes (and on some network mounts);
            // fall back to copy + verify + delete-source.
            Err(_) => copy_verify_delete(src, dst),
        }
    }

    fn delete(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| FqhError::io(path, e))
    }

    fn mkdir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| FqhError::io(path, e))
    }

    fn set_read_only(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o440);
            fs::set_permissions(path, perms).map_err(|e| FqhError::io(path, e))
        }
        #[cfg(not(unix))]
        {
            let meta = fs::metadata(path).map_err(|e| FqhError::io(path, e))?;
            let mut perms = meta.permissions();
            perms.set_readonly(true);
            fs::set_permissions(path, perms).map_err(|e| FqhError::io(path, e))
        }
    }

    fn remove_empty_dirs(&self, root: &Path) -> Result<usize> {
        let mut pruned = 0;
        prune_children(root, &mut pruned)?;
        Ok(pruned)
    }
}

/// Copy `src` to `dst`, verify the copy is complete, then delete the source.
/// A partial copy is removed and the source is kept — interrupted copies
/// must never lose data.
fn copy_verify_delete(src: &Path, dst: &Path) -> Result<()> {
    let src_len = fs::metadata(src).map_err(|e| FqhError::io(src, e))?.len();
    let copied = match fs::copy(src, dst) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(dst);
            return Err(FqhError::io(dst, e));
        }
    };
    let dst_len = fs::metadata(dst).map_err(|e| FqhError::io(dst, e))?.len();
    if copied != src_len || dst_len != src_len {
        let _ = fs::remove_file(dst);
        return Err(FqhError::Runtime {
            details: format!(
                "incomplete copy of {} ({dst_len} of {src_len} bytes), source retained",
                src.display()
            ),
        });
    }
    fs::remove_file(src).map_err(|e| FqhError::io(src, e))
}

/// Depth-first prune of empty directories below `dir` (exclusive).
fn prune_children(dir: &Path, pruned: &mut usize) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FqhError::io(dir, e)),
    };

    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        let Ok(ft) = entry.file_type() else {
            continue;
        };
        if !ft.is_dir() || ft.is_symlink() {
            continue;
        }
        let child = entry.path();
        prune_children(&child, pruned)?;
        // Leaves first: the child may have just become empty.
        if fs::read_dir(&child)
            .map(|mut it| it.next().is_none())
            .unwrap_or(false)
            && fs::remove_dir(&child).is_ok()
        {
            *pruned += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn truncate_shrinks_to_exact_length() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("log.log");
        fs::write(&path, vec![b'x'; 4096]).unwrap();

        RealFs.truncate(&path, 1024).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 1024);
    }

    #[test]
    fn truncate_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = RealFs.truncate(&tmp.path().join("gone.log"), 10).unwrap_err();
        assert_eq!(err.code(), "FQH-3001");
    }

    #[test]
    fn move_file_relocates_contents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.sql");
        let dst = tmp.path().join("sub/dst.sql");
        fs::write(&src, b"payload").unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();

        RealFs.move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"payload");
    }

    #[test]
    fn copy_fallback_preserves_source_on_failure() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.sql");
        fs::write(&src, b"payload").unwrap();
        // Destination parent missing: rename and copy both fail.
        let dst = tmp.path().join("missing-parent/dst.sql");

        let err = RealFs.move_file(&src, &dst).unwrap_err();
        assert!(err.is_recoverable());
        assert!(src.exists(), "source must survive a failed move");
    }

    #[test]
    fn delete_removes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("old.bak");
        fs::write(&path, b"x").unwrap();

        RealFs.delete(&path).unwrap();
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn set_read_only_applies_0440() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("locked.sql");
        fs::write(&path, b"x").unwrap();

        RealFs.set_read_only(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o440);
    }

    #[test]
    fn remove_empty_dirs_prunes_leaves_first() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        fs::create_dir_all(tmp.path().join("keep")).unwrap();
        fs::write(tmp.path().join("keep/file.bak"), b"x").unwrap();

        let pruned = RealFs.remove_empty_dirs(tmp.path()).unwrap();
        assert_eq!(pruned, 3);
        assert!(!tmp.path().join("a").exists());
        assert!(tmp.path().join("keep/file.bak").exists());
        // The root itself is never removed.
        assert!(tmp.path().exists());
    }

    #[test]
    fn remove_empty_dirs_on_missing_root_is_ok() {
        let tmp = TempDir::new().unwrap();
        let pruned = RealFs.remove_empty_dirs(&tmp.path().join("nope")).unwrap();
        assert_eq!(pruned, 0);
    }
}
