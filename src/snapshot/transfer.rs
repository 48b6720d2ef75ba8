//! Snapshot creation and transfer
//!
//! A backup of one set takes a read-only snapshot of the source subvolume
//! and pipes `btrfs send` into `btrfs receive` on the backup device:
//!
//! ```text
//! btrfs subvolume snapshot -r /home /snapshot/home/<date>
//! btrfs send [-p /snapshot/home/<reference>] /snapshot/home/<date> \
//!     | btrfs receive /mnt/backup/host/home
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{BtrarchError, BtrarchResult};
use crate::models::{BackupSet, SnapshotId};
use crate::process::{run_logged, spawn_logged, Tools};

/// Take a read-only snapshot of `source` at `target`
pub fn create_snapshot(tools: &Tools, source: &Path, target: &Path) -> BtrarchResult<()> {
    let mut cmd = Command::new(&tools.btrfs);
    cmd.args(["subvolume", "snapshot", "-r"]).arg(source).arg(target);

    run_logged(&mut cmd).map(|_| ()).map_err(|e| BtrarchError::Snapshot {
        source_path: source.display().to_string(),
        output: match e {
            BtrarchError::CommandFailed { output, .. } => output,
            other => other.to_string(),
        },
    })
}

/// Delete a snapshot subvolume, committing the transaction before returning
pub fn delete_subvolume(tools: &Tools, path: &Path) -> BtrarchResult<()> {
    let mut cmd = Command::new(&tools.btrfs);
    cmd.args(["subvolume", "delete", "--commit-after"]).arg(path);
    run_logged(&mut cmd).map(|_| ())
}

/// Snapshot a set as `date` and send it to the set's destination
///
/// With a `reference` the stream only carries the changes since that
/// snapshot; without one the whole subvolume is sent.
///
/// # Errors
///
/// - `Snapshot` if the read-only snapshot cannot be taken
/// - `ReceiveFailed` if `btrfs receive` exits non-zero, whatever send did
/// - `SendFailed` if receive succeeded but `btrfs send` exited non-zero
pub fn backup(
    tools: &Tools,
    date: &SnapshotId,
    reference: Option<&SnapshotId>,
    set: &BackupSet,
) -> BtrarchResult<()> {
    let local = set.local_dir().join(date.as_str());
    let remote = set.remote_dir();

    info!("Snapshotting {} as {}", set.path.display(), local.display());
    create_snapshot(tools, &set.path, &local)?;

    info!("Sending {} to {}", local.display(), remote.display());

    let send_err = tempfile::tempfile()
        .map_err(|e| BtrarchError::Io(format!("Failed to create temporary file: {}", e)))?;

    let mut send_cmd = Command::new(&tools.btrfs);
    send_cmd.arg("send");
    if let Some(reference) = reference {
        send_cmd.arg("-p").arg(set.local_dir().join(reference.as_str()));
    }
    send_cmd
        .arg(&local)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::from(send_err.try_clone()?));

    let mut send = spawn_logged(&mut send_cmd)?;
    let stream = send
        .stdout
        .take()
        .ok_or_else(|| BtrarchError::Io("btrfs send has no output pipe".into()))?;

    let mut receive_cmd = Command::new(&tools.btrfs);
    receive_cmd
        .arg("receive")
        .arg(&remote)
        .stdin(Stdio::from(stream))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let receive = spawn_logged(&mut receive_cmd);

    // The command keeps our copy of the pipe's read end alive. Once it is
    // gone, a receiver that exits early makes send fail with EPIPE instead
    // of blocking on a full pipe.
    drop(receive_cmd);

    let receive = match receive {
        Ok(child) => child,
        Err(e) => {
            let _ = send.wait();
            return Err(e);
        }
    };

    let received = receive
        .wait_with_output()
        .map_err(|e| BtrarchError::Io(format!("Failed to wait for btrfs receive: {}", e)))?;

    let receive_stdout = String::from_utf8_lossy(&received.stdout);
    let receive_stderr = String::from_utf8_lossy(&received.stderr).into_owned();
    if !receive_stdout.is_empty() {
        debug!("btrfs receive output: {}", receive_stdout);
    }
    if !receive_stderr.is_empty() {
        debug!("btrfs receive stderr: {}", receive_stderr);
    }

    if !received.status.success() {
        // Nothing reads the pipe any more, so send cannot block here
        let _ = send.wait();
        log_send_stderr(send_err);
        return Err(BtrarchError::ReceiveFailed {
            status: received.status.to_string(),
            stderr: receive_stderr,
        });
    }

    let send_status = send
        .wait()
        .map_err(|e| BtrarchError::Io(format!("Failed to wait for btrfs send: {}", e)))?;
    let send_stderr = log_send_stderr(send_err);

    if !send_status.success() {
        return Err(BtrarchError::SendFailed {
            status: send_status.to_string(),
            stderr: send_stderr,
        });
    }

    Ok(())
}

/// Read back what send wrote to its stderr file and log it
fn log_send_stderr(mut file: File) -> String {
    let mut text = String::new();
    if file.seek(SeekFrom::Start(0)).is_ok() {
        let _ = file.read_to_string(&mut text);
    }
    if !text.is_empty() {
        debug!("btrfs send stderr: {}", text);
    }
    text
}
