//! Directory mirroring and removal helpers.
//!
//! The original build driver shelled out to `rsync -a` for every staging
//! copy. Shelling out to `rsync` from Rust would just trade one external
//! dependency for another with worse portability (no `rsync` on a bare
//! Windows host, for instance), so these mirror the subset of `rsync -a`
//! semantics the orchestrator actually relies on: a recursive, permission
//! and mtime preserving copy of a directory tree into a destination,
//! merging into an existing destination rather than refusing to overwrite.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively copies the contents of `src` into `dst`, creating `dst` and
/// any intermediate directories as needed. Existing files under `dst` are
/// overwritten; files under `dst` with no counterpart under `src` are left
/// alone (a merge, not a mirror in the stricter rsync `--delete` sense —
/// the orchestrator always recreates the destination root itself first
/// when it wants a clean copy).
pub fn mirror_copy(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() && same_file::is_same_file(src, dst).unwrap_or(false) {
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under the root it was given");
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create directory {}", target.display()))?;
        } else if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            if let Ok(meta) = entry.metadata() {
                let mtime = filetime::FileTime::from_last_modification_time(&meta);
                let _ = filetime::set_file_mtime(&target, mtime);
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src)
        .with_context(|| format!("failed to read symlink {}", src.display()))?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst).ok();
    }
    std::os::unix::fs::symlink(&target, dst)
        .with_context(|| format!("failed to recreate symlink {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Removes a directory tree if it exists, producing a descriptive error on
/// failure rather than a bare `io::Error`.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to delete {}", path.display()))?;
    }
    Ok(())
}
