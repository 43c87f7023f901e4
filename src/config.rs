//! KEEPSAKE - Engine Configuration
//! Explicit location and format parameters for a store file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::version::FormatVersion;
use crate::error::{KeepsakeError, Result};

/// Extension of the live store file.
pub const STORE_EXTENSION: &str = "b";

/// Suffix appended to the live file name to form the backup file name.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Configuration for a Keepsake store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the live file and its backup.
    pub data_dir: PathBuf,

    /// Base name of the store; the live file is `<data_dir>/<name>.b`.
    pub name: String,

    /// Container version written in the header of newly created or saved files.
    pub version: FormatVersion,

    /// Whether to fsync the live file after it is rewritten.
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            name: "store".to_string(),
            version: FormatVersion::CURRENT,
            sync_writes: true,
        }
    }
}

impl Config {
    /// Create a new Config for the store `name` inside `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the container version written on save.
    pub fn with_version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable fsync after rewriting the live file.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Path of the live store file.
    pub fn file_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", self.name, STORE_EXTENSION))
    }

    /// Path of the backup produced by the last successful save.
    pub fn backup_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}{}", self.name, STORE_EXTENSION, BACKUP_SUFFIX))
    }

    /// Reject names that would escape `data_dir` or produce a hidden/empty file name.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(KeepsakeError::Config("store name must not be empty".into()));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(KeepsakeError::Config(format!(
                "store name {:?} must be a plain file name",
                self.name
            )));
        }
        Ok(())
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let config = Config::new("/tmp/stores", "inventory");
        assert_eq!(config.file_path(), PathBuf::from("/tmp/stores/inventory.b"));
        assert_eq!(
            config.backup_path(),
            PathBuf::from("/tmp/stores/inventory.b.bak")
        );
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(Config::new(".", "").validate().is_err());
        assert!(Config::new(".", "../escape").validate().is_err());
        assert!(Config::new(".", "..").validate().is_err());
        assert!(Config::new(".", "fine-name").validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::new("dir", "db").with_sync_writes(false);
        assert!(!config.sync_writes);
        assert_eq!(config.version, FormatVersion::CURRENT);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = Config::new("/srv/keepsake", "ledger").with_sync_writes(false);
        let bytes = bincode::serialize(&config).unwrap();
        let decoded: Config = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.data_dir, config.data_dir);
        assert_eq!(decoded.name, "ledger");
        assert_eq!(decoded.version, FormatVersion::V100);
        assert!(!decoded.sync_writes);
    }
}
