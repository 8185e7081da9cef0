//! Small synchronous filesystem helpers used by the installer.
//!
//! These return plain [`std::io::Result`] so callers can attach their own
//! operation context; the installer wraps failures into its filesystem
//! error variant with the path that broke.

use std::fs;
use std::io;
use std::path::Path;

/// Create `path` and any missing parents. Succeeds if it already exists.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Recursively copy `src` into `dst`, creating `dst`.
///
/// Symlinks are followed (the application tree is expected to contain
/// plain files and directories).
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Replace `dst` with a copy of the directory `src`, removing any
/// previous `dst` first.
pub fn replace_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    copy_dir_all(src, dst)
}

/// Overwrite the file `dst` with `src`.
pub fn replace_file(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.exists() {
        fs::remove_file(dst)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copy_dir_all_copies_nested_trees() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("nested/b.txt"), "b").unwrap();

        let dst = temp.path().join("dst");
        copy_dir_all(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
    }

    #[test]
    fn replace_dir_removes_stale_contents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("new.txt"), "new").unwrap();
        fs::write(dst.join("stale.txt"), "stale").unwrap();

        replace_dir(&src, &dst).unwrap();

        assert!(dst.join("new.txt").exists());
        assert!(!dst.join("stale.txt").exists());
    }
}
