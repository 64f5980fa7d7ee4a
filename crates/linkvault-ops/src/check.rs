//! The check run: index, group, unify.

use std::path::PathBuf;

use derive_builder::Builder;
use tracing::info;

use linkvault_core::{CheckReport, HashAlgorithm, VaultError};
use linkvault_dedup::{UnifyStats, find_clusters, unify_cluster};
use linkvault_scan::InodeIndex;

use crate::layout::snapshot_trees;

/// Configuration for a check run.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CheckConfig {
    /// Storage root to check.
    pub root: PathBuf,

    /// Actually relink duplicates; `false` only reports what a repair
    /// would reclaim.
    #[builder(default = "false")]
    pub repair: bool,

    /// Digest algorithm for content comparison.
    #[builder(default)]
    pub algorithm: HashAlgorithm,
}

impl CheckConfig {
    /// Create a new config builder.
    pub fn builder() -> CheckConfigBuilder {
        CheckConfigBuilder::default()
    }
}

/// Walk every snapshot tree under the root, find duplicate inodes, and
/// collapse them (when `repair` is set).
///
/// Structural problems with the root abort the run; everything per-path
/// becomes a warning on the report.
pub fn check(config: &CheckConfig) -> Result<CheckReport, VaultError> {
    let trees = snapshot_trees(&config.root)?;
    let mut index = InodeIndex::build(&trees)?;

    let files_scanned = index.files_scanned();
    let inodes_indexed = index.len() as u64;
    let mut warnings = index.take_warnings();

    let (clusters, hash_warnings) = find_clusters(&mut index, config.algorithm);
    warnings.extend(hash_warnings);

    let mut totals = UnifyStats::default();
    for cluster in &clusters {
        let (stats, cluster_warnings) = unify_cluster(&mut index, cluster, config.repair);
        totals.absorb(stats);
        warnings.extend(cluster_warnings);
    }

    info!(
        trees = trees.len(),
        files = files_scanned,
        clusters = clusters.len(),
        freed = totals.inodes_freed,
        bytes = totals.bytes_reclaimed,
        repair = config.repair,
        "check complete"
    );

    Ok(CheckReport {
        trees_walked: trees.len(),
        files_scanned,
        inodes_indexed,
        clusters_found: clusters.len(),
        paths_relinked: totals.paths_relinked,
        inodes_freed: totals.inodes_freed,
        bytes_reclaimed: totals.bytes_reclaimed,
        repaired: config.repair,
        warnings,
    })
}
