//! Snapshot rotation into week buckets.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use linkvault_core::{PathWarning, RotateReport, VaultError, WarningKind};

use crate::last::reset_last_pointer;
use crate::layout::top_level_snapshots;

/// Move aged snapshots into their week buckets.
///
/// Keeps the newest `max_snapshots` dated directories at the top level
/// and relocates the excess oldest ones, each into the bucket computed
/// from its own stamp. Buckets are created on first use. Moves are plain
/// renames; hardlink structure is untouched. A failed move leaves that
/// snapshot in place and the run continues.
///
/// With `count <= max_snapshots` the call is a logged no-op, which also
/// makes rotation idempotent: a partially rotated root simply presents
/// fewer top-level snapshots to the next run.
pub fn rotate(root: &Path, max_snapshots: usize) -> Result<RotateReport, VaultError> {
    let snapshots = top_level_snapshots(root)?;
    let found = snapshots.len();
    let excess = found.saturating_sub(max_snapshots);

    info!(found, max = max_snapshots, root = %root.display(), "rotation considered");
    if excess == 0 {
        info!("not enough snapshots to rotate");
        return Ok(RotateReport::noop(found));
    }

    let mut report = RotateReport::noop(found);
    // Sorted oldest first; the last element is the newest snapshot and
    // the rotation survivor set is the tail.
    let mut newest_location = match snapshots.last() {
        Some((_, path)) => path.clone(),
        None => return Ok(report),
    };

    for (stamp, path) in snapshots.iter().take(excess) {
        let bucket_dir = root.join(stamp.week().dir_name());
        if !bucket_dir.is_dir() {
            match fs::create_dir(&bucket_dir) {
                Ok(()) => {
                    info!(bucket = %bucket_dir.display(), "created week bucket");
                    report.buckets_created += 1;
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(err) => {
                    warn!(bucket = %bucket_dir.display(), error = %err, "couldn't create week bucket");
                    report.warnings.push(PathWarning::new(
                        &bucket_dir,
                        format!("couldn't create week bucket: {err}"),
                        WarningKind::MoveFailed,
                    ));
                    report.move_failures += 1;
                    continue;
                }
            }
        }

        let dest = bucket_dir.join(stamp.to_string());
        match fs::rename(path, &dest) {
            Ok(()) => {
                debug!(from = %path.display(), to = %dest.display(), "snapshot rotated");
                if *path == newest_location {
                    newest_location = dest;
                }
                report.moved += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "couldn't move snapshot, leaving in place");
                report.warnings.push(PathWarning::new(
                    path,
                    format!("couldn't move into week bucket: {err}"),
                    WarningKind::MoveFailed,
                ));
                report.move_failures += 1;
            }
        }
    }

    if reset_last_pointer(root, &newest_location) {
        report.last_pointer = Some(newest_location);
    } else {
        report.warnings.push(PathWarning::new(
            root.join(linkvault_core::LAST_POINTER),
            "couldn't update last pointer after rotation",
            WarningKind::LastPointer,
        ));
    }

    info!(
        moved = report.moved,
        buckets = report.buckets_created,
        failures = report.move_failures,
        "rotation performed"
    );
    Ok(report)
}
