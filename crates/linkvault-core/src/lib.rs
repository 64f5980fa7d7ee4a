//! Core types and traits for linkvault.
//!
//! This crate provides the fundamental data structures shared across the
//! linkvault workspace: snapshot and week-bucket naming, backup plans,
//! content hashes, errors, and run reports.

mod error;
mod hash;
mod plan;
mod report;
mod stamp;

pub use error::{PathWarning, VaultError, WarningKind};
pub use hash::{ContentHash, HashAlgorithm};
pub use plan::Plan;
pub use report::{BackupReport, CheckReport, RotateReport};
pub use stamp::{LAST_POINTER, SnapshotStamp, WeekBucket};
