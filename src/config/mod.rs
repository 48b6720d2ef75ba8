//! Configuration module for btrarch
//!
//! This module provides configuration management including:
//! - Config file path resolution
//! - Loading and validating the JSON configuration

pub mod paths;
pub mod settings;

pub use paths::ConfigPaths;
pub use settings::Config;
