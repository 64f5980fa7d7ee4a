//! Inode indexing for linkvault.
//!
//! Walks snapshot trees and builds the inode → entry mapping that the
//! duplicate grouper and unifier operate on. The walk is read-only and
//! makes exactly one metadata query per directory entry; file content is
//! never read here.

mod index;

pub use index::{InodeEntry, InodeIndex};
