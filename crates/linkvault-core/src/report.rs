//! Structured run reports.
//!
//! Every operation returns one of these instead of only human-readable
//! text; the CLI renders them as text or JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PathWarning;

/// Result of a snapshot-producing backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupReport {
    /// Stamp name of the snapshot this run produced (or attempted).
    pub snapshot: String,
    /// Full path of the snapshot directory.
    pub path: PathBuf,
    /// Exit code of the external sync command.
    pub sync_exit_code: i32,
    /// Whether the snapshot directory exists after the run.
    pub snapshot_created: bool,
    /// Whether the last pointer was re-pointed at the new snapshot.
    pub last_pointer_updated: bool,
    /// Whether this was a dry run (no pointer update attempted).
    pub dry_run: bool,
}

impl BackupReport {
    /// Whether the sync command reported success.
    pub fn sync_succeeded(&self) -> bool {
        self.sync_exit_code == 0
    }
}

/// Result of a check (deduplication) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Number of snapshot trees walked.
    pub trees_walked: usize,
    /// Regular-file paths scanned by the index walk.
    pub files_scanned: u64,
    /// Distinct inodes indexed.
    pub inodes_indexed: u64,
    /// Duplicate clusters found.
    pub clusters_found: usize,
    /// Paths relinked onto a surviving inode.
    pub paths_relinked: u64,
    /// Inodes whose last path was relinked away.
    pub inodes_freed: u64,
    /// Bytes reclaimed (size of each freed inode).
    pub bytes_reclaimed: u64,
    /// Whether the run actually mutated the filesystem.
    pub repaired: bool,
    /// Per-path warnings collected during the run.
    pub warnings: Vec<PathWarning>,
}

/// Result of a rotation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateReport {
    /// Snapshots found at the top level of the storage root.
    pub snapshots_found: usize,
    /// Snapshots moved into week buckets.
    pub moved: usize,
    /// Week bucket directories created by this run.
    pub buckets_created: usize,
    /// Snapshots that failed to move and were left in place.
    pub move_failures: usize,
    /// Where the last pointer points after the run, if it was updated.
    pub last_pointer: Option<PathBuf>,
    /// Per-path warnings collected during the run.
    pub warnings: Vec<PathWarning>,
}

impl RotateReport {
    /// A no-op report for a root below the retention threshold.
    pub fn noop(snapshots_found: usize) -> Self {
        Self {
            snapshots_found,
            moved: 0,
            buckets_created: 0,
            move_failures: 0,
            last_pointer: None,
            warnings: Vec::new(),
        }
    }
}
