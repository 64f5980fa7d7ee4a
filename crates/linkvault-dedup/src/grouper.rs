//! Staged duplicate grouping: size first, digest second.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use linkvault_core::{ContentHash, HashAlgorithm, PathWarning};
use linkvault_scan::InodeIndex;

use crate::hasher::hash_file;

/// A set of distinct inodes proven to hold byte-identical content.
#[derive(Debug, Clone)]
pub struct DuplicateCluster {
    /// Shared file size.
    pub size: u64,
    /// Shared content digest.
    pub hash: ContentHash,
    /// Inode numbers in the cluster, ascending. Always two or more.
    pub inodes: Vec<u64>,
}

impl DuplicateCluster {
    /// Bytes reclaimable by collapsing this cluster onto one inode.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.size * self.inodes.len().saturating_sub(1) as u64
    }
}

/// Partition the index into duplicate clusters.
///
/// Inodes with a unique size are discarded without ever being read.
/// Within each multi-inode size bucket, every inode is hashed once (the
/// digest is cached on its entry) and sub-grouped by digest; only
/// sub-groups of two or more inodes survive. Hash failures drop the
/// affected inode with a warning.
pub fn find_clusters(
    index: &mut InodeIndex,
    algorithm: HashAlgorithm,
) -> (Vec<DuplicateCluster>, Vec<PathWarning>) {
    let mut warnings = Vec::new();

    // Size buckets over all indexed inodes. BTreeMap keeps the cluster
    // order stable across runs.
    let mut by_size: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for entry in index.entries() {
        by_size.entry(entry.size).or_default().push(entry.inode);
    }

    let mut clusters = Vec::new();
    for (size, mut inodes) in by_size {
        if inodes.len() < 2 {
            continue;
        }
        inodes.sort_unstable();

        let mut by_hash: BTreeMap<ContentHash, Vec<u64>> = BTreeMap::new();
        for inode in inodes {
            let Some(digest) = digest_for(index, inode, algorithm, &mut warnings) else {
                continue;
            };
            by_hash.entry(digest).or_default().push(inode);
        }

        for (hash, matched) in by_hash {
            if matched.len() >= 2 {
                clusters.push(DuplicateCluster {
                    size,
                    hash,
                    inodes: matched,
                });
            }
        }
    }

    debug!(clusters = clusters.len(), "duplicate grouping complete");
    (clusters, warnings)
}

/// Cached digest for an inode, computing and storing it on first use.
fn digest_for(
    index: &mut InodeIndex,
    inode: u64,
    algorithm: HashAlgorithm,
    warnings: &mut Vec<PathWarning>,
) -> Option<ContentHash> {
    let entry = index.get_mut(inode)?;
    if let Some(digest) = entry.hash {
        return Some(digest);
    }
    let path = entry.primary_path()?.to_path_buf();
    match hash_file(&path, algorithm) {
        Ok(digest) => {
            entry.hash = Some(digest);
            Some(digest)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable, dropping from dedup");
            warnings.push(PathWarning::unreadable(&path, &err));
            None
        }
    }
}
