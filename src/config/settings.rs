//! Configuration file for btrarch
//!
//! The configuration names the encrypted backup device, the subvolumes to
//! back up and, optionally, the retention policy and tool locations:
//!
//! ```json
//! {
//!   "destination": {
//!     "device": "/dev/disk/by-id/ata-TOSHIBA_MQ01UBD100_33PAT945T",
//!     "mapper_name": "backup",
//!     "mount_point": "/mnt/backup"
//!   },
//!   "source": [
//!     { "path": "/home", "name": "home", "snapshot_dir": "/snapshot",
//!       "destination": "/mnt/backup/dell12" }
//!   ],
//!   "retention": [ { "days": 1, "count": 1 }, { "days": 6, "count": 6 } ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BtrarchError, BtrarchResult};
use crate::models::{BackupSet, DeviceBinding, RetentionPolicy};
use crate::process::Tools;

/// Typed contents of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The encrypted device backups are written to
    pub destination: DeviceBinding,

    /// Subvolumes to back up
    #[serde(default)]
    pub source: Vec<BackupSet>,

    /// Retention tiers, ascending by age
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Overrides for the external tool executables
    #[serde(default)]
    pub tools: Tools,
}

impl Config {
    /// Load and validate the configuration file
    pub fn load(path: &Path) -> BtrarchResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BtrarchError::Io(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&contents).map_err(|e| match e {
            BtrarchError::Json(msg) => BtrarchError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    /// Parse and validate a configuration document
    pub fn from_json(contents: &str) -> BtrarchResult<Self> {
        let config: Config = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and that set names are unique
    pub fn validate(&self) -> BtrarchResult<()> {
        self.destination.validate()?;

        let mut names = HashSet::new();
        for set in &self.source {
            set.validate()?;
            if !names.insert(set.name.as_str()) {
                return Err(BtrarchError::invalid_source(&set.name, "name is used twice"));
            }
        }

        Ok(())
    }
}
