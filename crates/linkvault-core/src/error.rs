//! Error and warning types for vault operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural errors that abort a run.
///
/// Per-path problems are never represented here; those become
/// [`PathWarning`] records attached to the run report.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Storage root does not exist.
    #[error("storage root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Storage root (or a snapshot tree root) is not a directory.
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Permission denied on a structural path.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Generic I/O error on a structural path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plan file could not be read or parsed.
    #[error("invalid plan file {path}: {message}")]
    InvalidPlan { path: PathBuf, message: String },

    /// External sync command could not be launched at all.
    #[error("failed to launch sync command `{command}`: {source}")]
    SyncSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    /// Create an I/O error with path context, classifying common kinds.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::RootNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of per-path warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Metadata query failed during the index walk.
    MetadataError,
    /// Directory entry could not be read during the walk.
    ReadError,
    /// File lives on a different device than the walk root.
    CrossDevice,
    /// File could not be hashed.
    Unreadable,
    /// Relink sequence failed for one path.
    RelinkFailed,
    /// Snapshot could not be moved into its week bucket.
    MoveFailed,
    /// LastPointer could not be updated (degraded state, not fatal).
    LastPointer,
}

/// Non-fatal warning tied to a single path.
///
/// Warnings are collected on run reports; they never change the overall
/// success status of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl PathWarning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Warning for a failed metadata query.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(
            path,
            format!("metadata query failed: {error}"),
            WarningKind::MetadataError,
        )
    }

    /// Warning for a file that could not be hashed.
    pub fn unreadable(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(
            path,
            format!("unreadable during hashing: {error}"),
            WarningKind::Unreadable,
        )
    }

    /// Warning for a failed relink step.
    pub fn relink_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(path, message, WarningKind::RelinkFailed)
    }
}
