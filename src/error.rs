//! Custom error types for btrarch
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for btrarch operations
#[derive(Error, Debug)]
pub enum BtrarchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for configuration values
    #[error("Validation error: {0}")]
    Validation(String),

    /// An external tool exited with a non-zero status
    #[error("{command} returned {status}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    /// An external tool could not be started at all
    #[error("Failed to start {command}: {reason}")]
    Spawn { command: String, reason: String },

    /// Creating the read-only snapshot of a source failed
    #[error("Snapshotting {source_path} failed")]
    Snapshot { source_path: String, output: String },

    /// The producing side of a transfer failed
    #[error("btrfs send failed ({status})")]
    SendFailed { status: String, stderr: String },

    /// The consuming side of a transfer failed
    #[error("btrfs receive failed ({status})")]
    ReceiveFailed { status: String, stderr: String },
}

impl BtrarchError {
    /// Create a validation error for a field of a backup set
    pub fn invalid_source(name: &str, reason: impl Into<String>) -> Self {
        Self::Validation(format!("source '{}': {}", name, reason.into()))
    }

    /// Check if this error came from an external tool invocation
    pub fn is_command_failure(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. }
                | Self::Spawn { .. }
                | Self::Snapshot { .. }
                | Self::SendFailed { .. }
                | Self::ReceiveFailed { .. }
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Output captured from the failing tool, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } | Self::Snapshot { output, .. } => Some(output),
            Self::SendFailed { stderr, .. } | Self::ReceiveFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BtrarchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BtrarchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for btrarch operations
pub type BtrarchResult<T> = Result<T, BtrarchError>;
