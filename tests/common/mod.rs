//! Helpers for driving the btrarch binary against stand-in tools

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable shell script into `dir`
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A `btrfs` stand-in that only understands `subvolume delete`
pub fn deleting_btrfs(dir: &Path) -> PathBuf {
    script(
        dir,
        "btrfs",
        r#"echo "$*" >> "$(dirname "$0")/btrfs.log"
[ "$1 $2" = "subvolume delete" ] || exit 1
rm -rf "$4""#,
    )
}

/// Write a configuration file with one backup set called `home`
pub fn write_config(dir: &Path, tools: &[(&str, &Path)]) -> PathBuf {
    let tools: Vec<String> = tools
        .iter()
        .map(|(name, path)| format!("\"{}\": \"{}\"", name, path.display()))
        .collect();

    let config = format!(
        r#"{{
  "destination": {{
    "device": "/dev/sdz",
    "mapper_name": "btrarch-test",
    "mount_point": "{mnt}"
  }},
  "source": [
    {{ "path": "{src}", "name": "home", "snapshot_dir": "{snap}", "destination": "{dst}" }}
  ],
  "tools": {{ {tools} }}
}}"#,
        mnt = dir.join("mnt").display(),
        src = dir.join("src").display(),
        snap = dir.join("snapshot").display(),
        dst = dir.join("backup").display(),
        tools = tools.join(", "),
    );

    let path = dir.join("btrarch.json");
    fs::write(&path, config).unwrap();
    path
}
