//! Storage root layout.
//!
//! A storage root holds dated snapshot directories, `week-*` bucket
//! directories containing relocated snapshots, and the `last` symlink.
//! Anything else is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use linkvault_core::{SnapshotStamp, VaultError, WeekBucket};

/// Validate that the storage root exists and is a directory.
pub fn ensure_root(root: &Path) -> Result<(), VaultError> {
    let meta = fs::symlink_metadata(root).map_err(|e| VaultError::io(root, e))?;
    if !meta.is_dir() {
        return Err(VaultError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Snapshot directories directly under `root`, sorted oldest first.
///
/// Only directories whose name round-trips the stamp format count;
/// week buckets, the last pointer and foreign entries are invisible.
pub fn top_level_snapshots(root: &Path) -> Result<Vec<(SnapshotStamp, PathBuf)>, VaultError> {
    ensure_root(root)?;
    let mut snapshots = snapshots_in(root)?;
    snapshots.sort_by_key(|(stamp, _)| *stamp);
    Ok(snapshots)
}

/// Every snapshot tree under `root`: top-level snapshots plus snapshots
/// already archived inside week buckets. Sorted for a stable walk order.
pub fn snapshot_trees(root: &Path) -> Result<Vec<PathBuf>, VaultError> {
    ensure_root(root)?;
    let mut trees: Vec<PathBuf> = snapshots_in(root)?
        .into_iter()
        .map(|(_, path)| path)
        .collect();

    for entry in fs::read_dir(root).map_err(|e| VaultError::io(root, e))? {
        let entry = entry.map_err(|e| VaultError::io(root, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if WeekBucket::parse(name).is_some() && entry.path().is_dir() {
            trees.extend(
                snapshots_in(&entry.path())?
                    .into_iter()
                    .map(|(_, path)| path),
            );
        }
    }

    trees.sort();
    Ok(trees)
}

/// Immediate children of `dir` that are snapshot directories.
fn snapshots_in(dir: &Path) -> Result<Vec<(SnapshotStamp, PathBuf)>, VaultError> {
    let mut snapshots = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| VaultError::io(dir, e))? {
        let entry = entry.map_err(|e| VaultError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(stamp) = SnapshotStamp::parse(name) {
            let path = entry.path();
            if path.is_dir() {
                snapshots.push((stamp, path));
            }
        }
    }
    Ok(snapshots)
}
