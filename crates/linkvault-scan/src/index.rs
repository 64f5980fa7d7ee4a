//! The inode → paths index.

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use linkvault_core::{ContentHash, PathWarning, VaultError, WarningKind};

/// One physical inode and every path referencing it, with cached size.
///
/// The content hash starts empty and is filled in lazily by the duplicate
/// grouper, only for inodes whose size collides with another inode's.
#[derive(Debug, Clone)]
pub struct InodeEntry {
    /// Inode number (valid within one device only).
    pub inode: u64,
    /// File size in bytes, as reported by the metadata query.
    pub size: u64,
    /// Cached content digest; `None` until the grouper needs it.
    pub hash: Option<ContentHash>,
    /// Every path referencing this inode, in discovery order.
    pub paths: IndexSet<PathBuf>,
}

impl InodeEntry {
    fn new(inode: u64, size: u64, first_path: PathBuf) -> Self {
        let mut paths = IndexSet::new();
        paths.insert(first_path);
        Self {
            inode,
            size,
            hash: None,
            paths,
        }
    }

    /// A representative path for this inode (the first discovered).
    pub fn primary_path(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// Number of known links to this inode within the indexed trees.
    pub fn link_count(&self) -> usize {
        self.paths.len()
    }
}

/// Ephemeral mapping from inode number to [`InodeEntry`], built fresh on
/// every check run and discarded afterwards.
#[derive(Debug, Default)]
pub struct InodeIndex {
    entries: HashMap<u64, InodeEntry>,
    files_scanned: u64,
    warnings: Vec<PathWarning>,
}

impl InodeIndex {
    /// Walk the given tree roots and build the index.
    ///
    /// Each root must be an existing directory (structural error
    /// otherwise). Per-path metadata failures are recorded as warnings and
    /// skipped. Files on a device other than their root's device are
    /// skipped with a warning: inode numbers are only comparable within
    /// one filesystem.
    pub fn build(roots: &[PathBuf]) -> Result<Self, VaultError> {
        let mut index = Self::default();
        for root in roots {
            index.walk_root(root)?;
        }
        debug!(
            files = index.files_scanned,
            inodes = index.entries.len(),
            "inode index built"
        );
        Ok(index)
    }

    fn walk_root(&mut self, root: &Path) -> Result<(), VaultError> {
        let root_meta = fs::symlink_metadata(root).map_err(|e| VaultError::io(root, e))?;
        if !root_meta.is_dir() {
            return Err(VaultError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        let root_device = root_meta.dev();

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .follow_links(false)
            .skip_hidden(false)
            .sort(true);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %err, "walk error, skipping");
                    self.warnings
                        .push(PathWarning::new(path, err.to_string(), WarningKind::ReadError));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "metadata query failed, skipping");
                    self.warnings.push(PathWarning::metadata_error(&path, &err));
                    continue;
                }
            };

            if meta.dev() != root_device {
                self.warnings.push(PathWarning::new(
                    &path,
                    "file on foreign device, not comparable",
                    WarningKind::CrossDevice,
                ));
                continue;
            }

            self.files_scanned += 1;
            match self.entries.entry(meta.ino()) {
                std::collections::hash_map::Entry::Occupied(mut occupied) => {
                    occupied.get_mut().paths.insert(path);
                }
                std::collections::hash_map::Entry::Vacant(vacant) => {
                    vacant.insert(InodeEntry::new(meta.ino(), meta.len(), path));
                }
            }
        }

        Ok(())
    }

    /// Number of distinct inodes indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Regular-file paths seen by the walk.
    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    /// Look up an entry by inode number.
    pub fn get(&self, inode: u64) -> Option<&InodeEntry> {
        self.entries.get(&inode)
    }

    /// Mutable lookup by inode number.
    pub fn get_mut(&mut self, inode: u64) -> Option<&mut InodeEntry> {
        self.entries.get_mut(&inode)
    }

    /// Remove an entry (used once an inode has been fully relinked away).
    pub fn remove(&mut self, inode: u64) -> Option<InodeEntry> {
        self.entries.remove(&inode)
    }

    /// Iterate over all entries.
    pub fn entries(&self) -> impl Iterator<Item = &InodeEntry> {
        self.entries.values()
    }

    /// Drain the warnings collected during the walk.
    pub fn take_warnings(&mut self) -> Vec<PathWarning> {
        std::mem::take(&mut self.warnings)
    }
}
