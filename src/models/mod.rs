//! Core data models for btrarch
//!
//! This module contains the data structures that describe what gets backed
//! up and how long it is kept: snapshot identifiers, retention tiers, backup
//! set definitions and the encrypted device binding.

pub mod backup_set;
pub mod device;
pub mod retention;
pub mod snapshot_id;

pub use backup_set::BackupSet;
pub use device::DeviceBinding;
pub use retention::{RetentionPolicy, RetentionTier};
pub use snapshot_id::SnapshotId;
