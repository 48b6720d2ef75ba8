//! btrarch - incremental, encrypted btrfs backups
//!
//! This library provides the core functionality of the btrarch backup tool.
//! It snapshots btrfs subvolumes, streams them with `btrfs send | btrfs
//! receive` onto a LUKS-encrypted backup device and keeps a bounded, tiered
//! history of snapshots on both sides.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Config file location, loading and validation
//! - `error`: Custom error types
//! - `models`: Snapshot identifiers, retention tiers, backup sets, device
//! - `process`: Logged invocation of external tools
//! - `snapshot`: Snapshot discovery, retention and transfer
//! - `device`: Opening, mounting and initializing the backup device
//! - `backup`: The backup run tying everything together
//! - `logging`: Console and file logging
//!
//! # Example
//!
//! ```rust,ignore
//! use btrarch::backup::{BackupManager, Mode, RunOptions};
//! use btrarch::config::{Config, ConfigPaths};
//!
//! let paths = ConfigPaths::new()?;
//! let config = Config::load(paths.config_file())?;
//! let code = BackupManager::new(config).run(Mode::Backup, &RunOptions::default());
//! ```

pub mod backup;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod models;
pub mod process;
pub mod snapshot;

#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use error::BtrarchError;
