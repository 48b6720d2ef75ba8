//! Backup runs for btrarch
//!
//! Drives one backup cycle over all configured sets.
//!
//! # Cycle
//!
//! 1. Unlock and mount the backup device
//! 2. For every set: snapshot the source, send it (incrementally when an
//!    earlier snapshot exists), then prune local and received snapshots
//!    with the retention policy
//! 3. Unmount and lock the device
//!
//! The first failing tool ends the run. The device stays mounted in that
//! case and the snapshot that was just taken is left in place; later runs
//! prune it like any other snapshot.
//!
//! Runs are not guarded against each other. Two concurrent runs on the same
//! snapshot directory must be prevented by the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use btrarch::backup::{BackupManager, Mode, RunOptions};
//! use btrarch::config::Config;
//!
//! let config = Config::load(path)?;
//! let manager = BackupManager::new(config);
//! std::process::exit(manager.run(Mode::Backup, &RunOptions::default()));
//! ```

mod manager;

pub use manager::{clean, cleanup, BackupManager, Mode, RunOptions};
