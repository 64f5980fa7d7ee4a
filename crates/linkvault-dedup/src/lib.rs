//! Duplicate detection and hardlink unification.
//!
//! Uses a two-stage filter for efficiency:
//! 1. Group indexed inodes by size (free: sizes were cached by the walk)
//! 2. Hash only inodes inside multi-inode size groups, then sub-group by
//!    digest
//!
//! Files with a unique size can never be content-identical to anything,
//! so the dominant cost of a dedup pass (hashing) is bounded to actual
//! size collisions. Clusters proven byte-identical are then collapsed
//! onto a single inode by the unifier.

mod grouper;
mod hasher;
mod unify;

pub use grouper::{DuplicateCluster, find_clusters};
pub use hasher::{HASH_BLOCK_SIZE, hash_file};
pub use unify::{UnifyStats, unify_cluster};
