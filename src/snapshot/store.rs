//! Snapshot discovery
//!
//! Snapshots of a set called `name` are the entries of `<dir>/<name>/`
//! whose file name starts with a `YYYY-MM-DD` date.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{BtrarchError, BtrarchResult};
use crate::models::SnapshotId;

/// List the snapshots of a backup set, oldest first
///
/// A missing directory yields an empty list.
pub fn list(dir: &Path, name: &str) -> BtrarchResult<Vec<SnapshotId>> {
    let set_dir = dir.join(name);

    let entries = match fs::read_dir(&set_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BtrarchError::Io(format!(
                "Failed to read snapshot directory {}: {}",
                set_dir.display(),
                e
            )))
        }
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            BtrarchError::Io(format!("Failed to read directory entry: {}", e))
        })?;

        if let Some(id) = entry.file_name().to_str().and_then(SnapshotId::parse) {
            ids.push(id);
        }
    }

    ids.sort();
    Ok(ids)
}

/// The most recent snapshot of a backup set
///
/// `None` means there is no earlier snapshot and the next transfer has to
/// be a full one.
pub fn latest(dir: &Path, name: &str) -> BtrarchResult<Option<SnapshotId>> {
    Ok(list(dir, name)?.pop())
}
