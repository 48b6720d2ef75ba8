//! External tool invocation
//!
//! Every call to `btrfs`, `cryptsetup`, `mount` and friends goes through this
//! module so that the command line and its captured output end up in the
//! debug log, and a non-zero exit becomes a `BtrarchError::CommandFailed`.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BtrarchError, BtrarchResult};

/// Executables of the external tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub btrfs: PathBuf,
    pub cryptsetup: PathBuf,
    pub mount: PathBuf,
    pub umount: PathBuf,
    pub mkfs: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            btrfs: "btrfs".into(),
            cryptsetup: "cryptsetup".into(),
            mount: "mount".into(),
            umount: "umount".into(),
            mkfs: "mkfs.btrfs".into(),
        }
    }
}

/// Render a command line as `'prog' 'arg1' 'arg2'`
pub fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(arg: &OsStr) -> String {
    format!("'{}'", arg.to_string_lossy())
}

/// Merge stdout and stderr of a finished tool into one text block
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

/// Run a tool to completion, capturing its output
///
/// The output is logged at debug level. A non-zero exit status is returned
/// as `CommandFailed` carrying the captured output.
pub fn run_logged(cmd: &mut Command) -> BtrarchResult<String> {
    let line = describe(cmd);
    debug!("Calling: {}", line);

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| BtrarchError::Spawn {
            command: line.clone(),
            reason: e.to_string(),
        })?;

    let text = combined_output(&output);
    if !text.is_empty() {
        debug!("Output:\n{}", text);
    }

    if !output.status.success() {
        return Err(BtrarchError::CommandFailed {
            command: line,
            status: output.status.to_string(),
            output: text,
        });
    }

    Ok(text)
}

/// Run a tool attached to the terminal
///
/// Used for interactive tools that prompt for a passphrase. Nothing is
/// captured.
pub fn run_interactive(cmd: &mut Command) -> BtrarchResult<()> {
    let line = describe(cmd);
    debug!("Calling: {}", line);

    let status = cmd.status().map_err(|e| BtrarchError::Spawn {
        command: line.clone(),
        reason: e.to_string(),
    })?;

    if !status.success() {
        return Err(BtrarchError::CommandFailed {
            command: line,
            status: status.to_string(),
            output: String::new(),
        });
    }

    Ok(())
}

/// Start a tool without waiting for it
pub fn spawn_logged(cmd: &mut Command) -> BtrarchResult<std::process::Child> {
    let line = describe(cmd);
    debug!("Calling: {}", line);

    cmd.spawn().map_err(|e| BtrarchError::Spawn {
        command: line,
        reason: e.to_string(),
    })
}
