//! Hardlink unification of duplicate clusters.
//!
//! For each cluster the inode with the most paths survives; every path of
//! the other inodes is relinked onto it. The relink sequence never
//! unlinks first: a hardlink to the survivor is created at a temporary
//! name, verified, then renamed over the old path. The rename is the
//! only step that replaces the old directory entry, so any earlier
//! failure leaves the old file fully intact.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use linkvault_core::PathWarning;
use linkvault_scan::InodeIndex;

use crate::grouper::DuplicateCluster;

const TEMP_SUFFIX: &str = ".lvtmp";

/// Per-cluster unification outcome, aggregated over a whole check run.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnifyStats {
    /// Paths moved onto a surviving inode.
    pub paths_relinked: u64,
    /// Inodes whose last path was relinked away.
    pub inodes_freed: u64,
    /// Bytes reclaimed (one file size per freed inode).
    pub bytes_reclaimed: u64,
}

impl UnifyStats {
    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: UnifyStats) {
        self.paths_relinked += other.paths_relinked;
        self.inodes_freed += other.inodes_freed;
        self.bytes_reclaimed += other.bytes_reclaimed;
    }
}

/// Collapse one duplicate cluster onto a single inode.
///
/// With `repair = false` nothing on disk is touched; the stats report
/// what a repair run would reclaim. Individual relink failures are
/// logged, recorded as warnings, and leave that path on its old inode;
/// they never abort the cluster.
pub fn unify_cluster(
    index: &mut InodeIndex,
    cluster: &DuplicateCluster,
    repair: bool,
) -> (UnifyStats, Vec<PathWarning>) {
    let mut stats = UnifyStats::default();
    let mut warnings = Vec::new();

    let Some(survivor) = pick_survivor(index, cluster) else {
        return (stats, warnings);
    };
    let Some(survivor_path) = index
        .get(survivor)
        .and_then(|entry| entry.primary_path().map(Path::to_path_buf))
    else {
        return (stats, warnings);
    };

    for &donor in &cluster.inodes {
        if donor == survivor {
            continue;
        }
        let Some(entry) = index.get(donor) else {
            continue;
        };
        let donor_size = entry.size;
        let donor_paths: Vec<PathBuf> = entry.paths.iter().cloned().collect();

        if !repair {
            stats.paths_relinked += donor_paths.len() as u64;
            stats.inodes_freed += 1;
            stats.bytes_reclaimed += donor_size;
            continue;
        }

        for path in donor_paths {
            match relink(&survivor_path, survivor, &path) {
                Ok(()) => {
                    if let Some(donor_entry) = index.get_mut(donor) {
                        donor_entry.paths.shift_remove(&path);
                    }
                    if let Some(survivor_entry) = index.get_mut(survivor) {
                        survivor_entry.paths.insert(path);
                    }
                    stats.paths_relinked += 1;
                }
                Err(message) => {
                    warn!(path = %path.display(), message, "relink failed, path left on old inode");
                    warnings.push(PathWarning::relink_failed(&path, message));
                }
            }
        }

        if index.get(donor).is_some_and(|entry| entry.paths.is_empty()) {
            index.remove(donor);
            stats.inodes_freed += 1;
            stats.bytes_reclaimed += donor_size;
        }
    }

    if stats.bytes_reclaimed > 0 {
        info!(
            survivor,
            freed = stats.inodes_freed,
            bytes = stats.bytes_reclaimed,
            repair,
            "cluster unified"
        );
    }
    (stats, warnings)
}

/// Survivor: most paths wins; ties go to the lowest inode number so the
/// canonical inode is stable across runs regardless of discovery order.
fn pick_survivor(index: &InodeIndex, cluster: &DuplicateCluster) -> Option<u64> {
    cluster
        .inodes
        .iter()
        .filter_map(|&inode| index.get(inode))
        .max_by_key(|entry| (entry.link_count(), std::cmp::Reverse(entry.inode)))
        .map(|entry| entry.inode)
}

/// Replace `path` with a hardlink to the survivor without ever leaving
/// the name unlinked: link to a temp name, verify, rename over.
fn relink(survivor_path: &Path, survivor_inode: u64, path: &Path) -> Result<(), String> {
    let parent = path
        .parent()
        .ok_or_else(|| "path has no parent directory".to_string())?;
    let name = path
        .file_name()
        .ok_or_else(|| "path has no file name".to_string())?;
    let temp = parent.join(format!(".{}{TEMP_SUFFIX}", name.to_string_lossy()));

    // Stale temp from an interrupted run.
    match fs::remove_file(&temp) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(format!("cannot clear temp link: {err}")),
    }

    fs::hard_link(survivor_path, &temp).map_err(|err| format!("hardlink failed: {err}"))?;

    let verified = fs::symlink_metadata(&temp)
        .map(|meta| meta.ino() == survivor_inode)
        .unwrap_or(false);
    if !verified {
        let _ = fs::remove_file(&temp);
        return Err("temp link does not resolve to survivor inode".to_string());
    }

    if let Err(err) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(format!("rename over old path failed: {err}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::find_clusters;
    use linkvault_core::HashAlgorithm;
    use tempfile::TempDir;

    fn inode_of(path: &Path) -> u64 {
        fs::symlink_metadata(path).unwrap().ino()
    }

    fn nlink_of(path: &Path) -> u64 {
        fs::symlink_metadata(path).unwrap().nlink()
    }

    #[test]
    fn duplicates_collapse_onto_most_linked_inode() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let c = temp.path().join("c");
        fs::write(&a, b"payload").unwrap();
        fs::hard_link(&a, &b).unwrap(); // a+b share an inode, 2 paths
        fs::write(&c, b"payload").unwrap(); // same content, own inode

        let well_linked = inode_of(&a);

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        assert_eq!(clusters.len(), 1);

        let (stats, warnings) = unify_cluster(&mut index, &clusters[0], true);
        assert!(warnings.is_empty());
        assert_eq!(stats.paths_relinked, 1);
        assert_eq!(stats.inodes_freed, 1);
        assert_eq!(stats.bytes_reclaimed, 7);

        // All three paths now reference the well-linked inode.
        assert_eq!(inode_of(&a), well_linked);
        assert_eq!(inode_of(&b), well_linked);
        assert_eq!(inode_of(&c), well_linked);
        assert_eq!(nlink_of(&a), 3);
        assert_eq!(fs::read(&c).unwrap(), b"payload");
    }

    #[test]
    fn tie_break_is_lowest_inode() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, b"tied").unwrap();
        fs::write(&b, b"tied").unwrap();
        let expected = inode_of(&a).min(inode_of(&b));

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        let (_, warnings) = unify_cluster(&mut index, &clusters[0], true);

        assert!(warnings.is_empty());
        assert_eq!(inode_of(&a), expected);
        assert_eq!(inode_of(&b), expected);
    }

    #[test]
    fn dry_run_reports_without_mutating() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, b"payload").unwrap();
        fs::write(&b, b"payload").unwrap();

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        let (stats, _) = unify_cluster(&mut index, &clusters[0], false);

        assert_eq!(stats.inodes_freed, 1);
        assert_eq!(stats.bytes_reclaimed, 7);
        assert_ne!(inode_of(&a), inode_of(&b));
        assert_eq!(nlink_of(&a), 1);
    }

    #[test]
    fn bookkeeping_moves_paths_to_survivor() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, b"payload").unwrap();
        fs::write(&b, b"payload").unwrap();

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        unify_cluster(&mut index, &clusters[0], true);

        // One entry left, holding both paths.
        assert_eq!(index.len(), 1);
        let survivor = index.entries().next().unwrap();
        assert_eq!(survivor.link_count(), 2);
    }

    #[test]
    fn relink_failure_leaves_path_on_old_inode() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        let c = temp.path().join("c");
        fs::write(&a, b"payload").unwrap();
        fs::hard_link(&a, &b).unwrap(); // a+b survive the tie
        fs::write(&c, b"payload").unwrap();

        let donor = inode_of(&c);

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        assert_eq!(clusters.len(), 1);

        // The survivor's primary path vanishes before the relink; the
        // hardlink step must fail and leave c untouched.
        fs::remove_file(&a).unwrap();

        let (stats, warnings) = unify_cluster(&mut index, &clusters[0], true);

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, linkvault_core::WarningKind::RelinkFailed);
        assert_eq!(warnings[0].path, c);
        assert_eq!(stats.paths_relinked, 0);
        assert_eq!(stats.inodes_freed, 0);
        assert_eq!(stats.bytes_reclaimed, 0);

        assert_eq!(inode_of(&c), donor);
        assert_eq!(fs::read(&c).unwrap(), b"payload");
        assert!(index.get(donor).is_some());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), b"payload").unwrap();
        fs::write(temp.path().join("b"), b"payload").unwrap();

        let mut index = InodeIndex::build(&[temp.path().to_path_buf()]).unwrap();
        let (clusters, _) = find_clusters(&mut index, HashAlgorithm::Blake3);
        unify_cluster(&mut index, &clusters[0], true);

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty());
    }
}
