//! LastPointer maintenance.
//!
//! The `last` symlink at the storage root names the most recent snapshot.
//! A stale or missing pointer is a recoverable, degraded state: updates
//! that fail are logged, never fatal.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use linkvault_core::LAST_POINTER;

/// Re-point the last pointer at `target`. Returns whether it succeeded.
pub fn reset_last_pointer(root: &Path, target: &Path) -> bool {
    let link = root.join(LAST_POINTER);

    match fs::remove_file(&link) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            debug!(link = %link.display(), error = %err, "couldn't unlink last pointer");
        }
    }

    match std::os::unix::fs::symlink(target, &link) {
        Ok(()) => {
            info!(target = %target.display(), "last pointer updated");
            true
        }
        Err(err) => {
            warn!(
                target = %target.display(),
                error = %err,
                "couldn't update last pointer, vault is in a degraded state"
            );
            false
        }
    }
}

/// Where the last pointer currently points, if it exists.
pub fn read_last_pointer(root: &Path) -> Option<PathBuf> {
    fs::read_link(root.join(LAST_POINTER)).ok()
}
