//! Backup set definitions
//!
//! A backup set names one subvolume and where its local snapshots and its
//! received copies live. Snapshots are kept at
//! `<snapshot_dir>/<name>/<id>`, received copies at
//! `<destination>/<name>/<id>`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BtrarchError, BtrarchResult};

/// One source subvolume and its snapshot/backup locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSet {
    /// Subvolume to snapshot, e.g. `/home`
    pub path: PathBuf,
    /// Name of the set, used as directory name below both locations
    pub name: String,
    /// Directory holding local snapshots, e.g. `/snapshot`
    pub snapshot_dir: PathBuf,
    /// Directory on the backup device receiving the snapshots
    pub destination: PathBuf,
}

impl BackupSet {
    /// Directory holding the local snapshots of this set
    pub fn local_dir(&self) -> PathBuf {
        self.snapshot_dir.join(&self.name)
    }

    /// Directory holding the received copies of this set
    pub fn remote_dir(&self) -> PathBuf {
        self.destination.join(&self.name)
    }

    /// Validate required fields
    pub fn validate(&self) -> BtrarchResult<()> {
        if self.name.trim().is_empty() {
            return Err(BtrarchError::Validation(
                "source name must not be empty".into(),
            ));
        }
        if self.name.contains('/') || self.name == "." || self.name == ".." {
            return Err(BtrarchError::invalid_source(
                &self.name,
                "name must be a single path component",
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(BtrarchError::invalid_source(&self.name, "path is empty"));
        }
        if self.snapshot_dir.as_os_str().is_empty() {
            return Err(BtrarchError::invalid_source(
                &self.name,
                "snapshot_dir is empty",
            ));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(BtrarchError::invalid_source(
                &self.name,
                "destination is empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> BackupSet {
        BackupSet {
            path: "/home".into(),
            name: "home".into(),
            snapshot_dir: "/snapshot".into(),
            destination: "/mnt/backup/dell12".into(),
        }
    }

    #[test]
    fn test_dirs() {
        let set = home();
        assert_eq!(set.local_dir(), PathBuf::from("/snapshot/home"));
        assert_eq!(set.remote_dir(), PathBuf::from("/mnt/backup/dell12/home"));
    }

    #[test]
    fn test_validate() {
        assert!(home().validate().is_ok());

        let mut set = home();
        set.name = "a/b".into();
        assert!(set.validate().unwrap_err().is_validation());

        let mut set = home();
        set.destination = PathBuf::new();
        assert!(set.validate().is_err());

        let mut set = home();
        set.name = "  ".into();
        assert!(set.validate().is_err());
    }
}
