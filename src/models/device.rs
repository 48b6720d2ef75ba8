//! Encrypted backup device binding

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{BtrarchError, BtrarchResult};

/// The LUKS-encrypted device backups are written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// Block device, e.g. `/dev/disk/by-id/ata-TOSHIBA_MQ01UBD100_33PAT945T`
    pub device: PathBuf,
    /// Name of the unlocked mapping below `/dev/mapper`
    pub mapper_name: String,
    /// Where the unlocked filesystem is mounted
    pub mount_point: PathBuf,
}

impl DeviceBinding {
    /// Path of the unlocked device, `/dev/mapper/<mapper_name>`
    pub fn mapper_path(&self) -> PathBuf {
        PathBuf::from("/dev/mapper").join(&self.mapper_name)
    }

    /// Validate required fields
    pub fn validate(&self) -> BtrarchResult<()> {
        if self.device.as_os_str().is_empty() {
            return Err(BtrarchError::Validation("destination device is empty".into()));
        }
        if self.mapper_name.trim().is_empty() || self.mapper_name.contains('/') {
            return Err(BtrarchError::Validation(format!(
                "invalid mapper name: '{}'",
                self.mapper_name
            )));
        }
        if self.mount_point.as_os_str().is_empty() {
            return Err(BtrarchError::Validation("mount point is empty".into()));
        }
        Ok(())
    }
}
