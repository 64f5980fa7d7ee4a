//! Backup plans.
//!
//! A plan describes one backup destination: which origins feed it, where
//! the storage root lives, and how many top-level snapshots to retain
//! before rotation. Plans are stored as TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::hash::HashAlgorithm;

/// A backup plan for one storage root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Source locations to back up.
    #[serde(default)]
    pub origins: Vec<String>,

    /// Storage root holding snapshots, week buckets and the last pointer.
    pub root: PathBuf,

    /// Maximum number of top-level snapshots retained before rotation.
    #[serde(default = "default_rotate_max")]
    pub rotate_max: usize,

    /// Exclude patterns passed to the sync tool.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Size cap for individual files (sync tool syntax, e.g. "500M").
    #[serde(default = "default_max_size")]
    pub max_size: String,

    /// Extra arguments appended to the sync command line.
    #[serde(default)]
    pub sync_args: Vec<String>,

    /// Sync command to invoke.
    #[serde(default = "default_sync_command")]
    pub sync_command: String,

    /// Digest algorithm used by check runs.
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Host the origins live on, for remote origins.
    #[serde(default)]
    pub origin_host: Option<String>,

    /// Rsync-daemon module on the origin host.
    #[serde(default)]
    pub origin_module: Option<String>,

    /// SSH user on the origin host.
    #[serde(default)]
    pub origin_user: Option<String>,
}

fn default_rotate_max() -> usize {
    10
}

fn default_max_size() -> String {
    "500M".to_string()
}

fn default_sync_command() -> String {
    "rsync".to_string()
}

impl Plan {
    /// Create a minimal local plan.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            origins: Vec::new(),
            root: root.into(),
            rotate_max: default_rotate_max(),
            excludes: Vec::new(),
            max_size: default_max_size(),
            sync_args: Vec::new(),
            sync_command: default_sync_command(),
            hash_algorithm: HashAlgorithm::default(),
            origin_host: None,
            origin_module: None,
            origin_user: None,
        }
    }

    /// Load a plan from a TOML file.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        let text = std::fs::read_to_string(path).map_err(|e| VaultError::InvalidPlan {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| VaultError::InvalidPlan {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Origins with host/module/user access prefixes applied.
    ///
    /// A host plus module yields rsync-daemon origins
    /// (`host::module/path`); a host plus user yields ssh origins
    /// (`user@host:path`); otherwise origins are taken verbatim.
    pub fn resolved_origins(&self) -> Vec<String> {
        match (&self.origin_host, &self.origin_module, &self.origin_user) {
            (Some(host), Some(module), _) => self
                .origins
                .iter()
                .map(|origin| format!("{host}::{module}/{origin}"))
                .collect(),
            (Some(host), None, Some(user)) => self
                .origins
                .iter()
                .map(|origin| format!("{user}@{host}:{origin}"))
                .collect(),
            _ => self.origins.clone(),
        }
    }

    /// `--exclude <pattern>` argument pairs for the sync command line.
    pub fn exclude_args(&self) -> Vec<String> {
        self.excludes
            .iter()
            .flat_map(|pattern| ["--exclude".to_string(), pattern.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let plan = Plan::new("/vault");
        assert_eq!(plan.rotate_max, 10);
        assert_eq!(plan.max_size, "500M");
        assert_eq!(plan.sync_command, "rsync");
        assert_eq!(plan.hash_algorithm, HashAlgorithm::Blake3);
    }

    #[test]
    fn ssh_origins() {
        let mut plan = Plan::new("/vault");
        plan.origins = vec!["/home".to_string(), "/etc".to_string()];
        plan.origin_host = Some("box".to_string());
        plan.origin_user = Some("backup".to_string());
        assert_eq!(
            plan.resolved_origins(),
            vec!["backup@box:/home", "backup@box:/etc"]
        );
    }

    #[test]
    fn rsync_module_origins_take_precedence() {
        let mut plan = Plan::new("/vault");
        plan.origins = vec!["music".to_string()];
        plan.origin_host = Some("box".to_string());
        plan.origin_module = Some("data".to_string());
        plan.origin_user = Some("ignored".to_string());
        assert_eq!(plan.resolved_origins(), vec!["box::data/music"]);
    }

    #[test]
    fn exclude_args_interleaved() {
        let mut plan = Plan::new("/vault");
        plan.excludes = vec!["*.tmp".to_string(), ".cache".to_string()];
        assert_eq!(
            plan.exclude_args(),
            vec!["--exclude", "*.tmp", "--exclude", ".cache"]
        );
    }
}
