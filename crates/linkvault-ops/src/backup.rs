//! Snapshot creation via the external sync tool.
//!
//! The engine does not transfer files itself: it composes a sync command
//! line (rsync by default) that hardlinks unchanged files against the
//! last pointer, runs it, and maintains the pointer afterwards. The sync
//! tool's output is expected to be a snapshot directory named after the
//! run's stamp.

use std::process::Command;

use tracing::{debug, error, info};

use linkvault_core::{BackupReport, LAST_POINTER, Plan, SnapshotStamp, VaultError};

use crate::last::reset_last_pointer;
use crate::layout::ensure_root;

/// Produce a new dated snapshot of the plan's origins.
///
/// With `dry_run` the sync tool is asked not to transfer anything and the
/// last pointer is left alone. A nonzero sync exit is reported, not
/// raised; only failing to launch the command at all is an error.
pub fn backup(plan: &Plan, dry_run: bool) -> Result<BackupReport, VaultError> {
    ensure_root(&plan.root)?;

    let stamp = SnapshotStamp::now();
    let snapshot = stamp.to_string();
    let copy_dir = plan.root.join(&snapshot);
    let last = plan.root.join(LAST_POINTER);

    let mut command = Command::new(&plan.sync_command);
    command
        .arg("-az")
        .arg("--delete")
        .arg("--delete-excluded")
        .arg("--itemize-changes")
        .arg("--max-size")
        .arg(&plan.max_size)
        .arg("--link-dest")
        .arg(&last)
        .args(&plan.sync_args)
        .args(plan.exclude_args());
    if dry_run {
        command.arg("--dry-run");
    }
    command.args(plan.resolved_origins()).arg(&copy_dir);

    debug!(?command, "sync call");
    info!(
        origins = plan.origins.len(),
        target = %copy_dir.display(),
        "starting backup"
    );

    let status = command.status().map_err(|e| VaultError::SyncSpawn {
        command: plan.sync_command.clone(),
        source: e,
    })?;
    let sync_exit_code = status.code().unwrap_or(-1);
    let snapshot_created = copy_dir.is_dir();

    if sync_exit_code == 0 {
        info!(snapshot = %snapshot, "copy successful");
    } else {
        error!(code = sync_exit_code, "sync command failed");
    }

    // The pointer moves only when a usable snapshot directory exists;
    // a partially failed transfer that left one still counts, but a
    // clean exit that produced nothing must not dangle the pointer.
    let last_pointer_updated = if !dry_run && snapshot_created {
        reset_last_pointer(&plan.root, &copy_dir)
    } else {
        false
    };

    Ok(BackupReport {
        snapshot,
        path: copy_dir,
        sync_exit_code,
        snapshot_created,
        last_pointer_updated,
        dry_run,
    })
}
