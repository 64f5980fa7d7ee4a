//! Vault operations for linkvault.
//!
//! The three operator entry points over one storage root:
//! - [`backup`]: produce a new dated snapshot via the external sync tool,
//!   hardlinking unchanged files against the last pointer
//! - [`check`]: walk every snapshot tree, find duplicate inodes, and
//!   (optionally) collapse them onto shared hardlinks
//! - [`rotate`]: relocate aged snapshots into week buckets
//!
//! All three assume operator-serialized invocation; none of them may run
//! concurrently with another against the same root.

mod backup;
mod check;
mod last;
mod layout;
mod rotate;

pub use backup::backup;
pub use check::{CheckConfig, CheckConfigBuilder, check};
pub use last::{read_last_pointer, reset_last_pointer};
pub use layout::{snapshot_trees, top_level_snapshots};
pub use rotate::rotate;
