//! Test doubles shared by the unit tests

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::process::Tools;

/// Exit codes the fake `btrfs send` / `btrfs receive` finish with
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeBtrfs {
    pub send_exit: i32,
    pub receive_exit: i32,
    /// Bytes of padding send writes after the snapshot name
    pub send_padding: u64,
}

/// Write a shell script standing in for `btrfs` into `dir`
///
/// Snapshots and received subvolumes become plain directories. Every call
/// is appended to `dir/btrfs.log`.
pub fn fake_btrfs(dir: &Path, behaviour: FakeBtrfs) -> Tools {
    let log = dir.join("btrfs.log");
    let script = format!(
        r#"#!/bin/sh
echo "$*" >> '{log}'
case "$1" in
subvolume)
    case "$2" in
    snapshot)
        [ -d "$4" ] || {{ echo "ERROR: Not a Btrfs subvolume: $4" >&2; exit 1; }}
        mkdir "$5" || exit 1
        echo "Create a readonly snapshot of '$4' in '$5'"
        ;;
    delete)
        echo "Delete subvolume (commit): '$4'"
        rm -rf "$4"
        ;;
    esac
    ;;
send)
    for last; do :; done
    echo "At subvol $last" >&2
    [ {send} -eq 0 ] || exit {send}
    basename "$last"
    [ {padding} -eq 0 ] || head -c {padding} /dev/zero
    ;;
receive)
    [ {receive} -eq 0 ] || {{ echo "ERROR: receive failed" >&2; exit {receive}; }}
    read name
    cat >/dev/null
    mkdir -p "$2/$name"
    echo "At subvol $name" >&2
    ;;
esac
"#,
        log = log.display(),
        send = behaviour.send_exit,
        receive = behaviour.receive_exit,
        padding = behaviour.send_padding,
    );

    let path = dir.join("btrfs");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    Tools {
        btrfs: path,
        ..Tools::default()
    }
}

/// A stand-in for tools that only need to succeed or fail
pub fn fake_tool(dir: &Path, name: &str, exit: i32) -> std::path::PathBuf {
    let log = dir.join(format!("{}.log", name));
    let script = format!(
        "#!/bin/sh\necho \"$*\" >> '{}'\nexit {}\n",
        log.display(),
        exit
    );

    let path = dir.join(name);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
