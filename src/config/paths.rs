//! Path management for btrarch
//!
//! ## Path Resolution Order
//!
//! 1. An explicit `--config` argument (or `BTRARCH_CONFIG`)
//! 2. `$XDG_CONFIG_HOME/btrarch.json`
//! 3. `~/.config/btrarch.json`
//!
//! A leading `~/` in an explicit path is expanded to the home directory.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::BtrarchError;

/// File name of the configuration below the config directory
const CONFIG_FILE_NAME: &str = "btrarch.json";

/// Resolves where btrarch reads its configuration from
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    config_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, BtrarchError> {
        let config_base = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home_dir()?.join(".config"),
        };

        Ok(Self {
            config_file: config_base.join(CONFIG_FILE_NAME),
        })
    }

    /// Use an explicit configuration file, expanding a leading `~/`
    pub fn with_config_file(path: impl AsRef<Path>) -> Result<Self, BtrarchError> {
        Ok(Self {
            config_file: expand_home(path.as_ref())?,
        })
    }

    /// Get the path to the configuration file
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }
}

fn home_dir() -> Result<PathBuf, BtrarchError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or_else(|| BtrarchError::Config("Could not determine home directory".into()))
}

/// Replace a leading `~` component with the home directory
fn expand_home(path: &Path) -> Result<PathBuf, BtrarchError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}
