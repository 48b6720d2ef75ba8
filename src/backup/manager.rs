//! Backup manager for btrarch
//!
//! Runs the backup cycle, the clean-only mode and device initialization.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{error, info};

use crate::config::Config;
use crate::device;
use crate::error::{BtrarchError, BtrarchResult};
use crate::models::{BackupSet, RetentionPolicy, SnapshotId};
use crate::process::Tools;
use crate::snapshot::{self, delete_subvolume};

/// What a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Snapshot, transfer and prune every set
    #[default]
    Backup,
    /// Delete all local snapshots except the newest, without the device
    Clean,
    /// Encrypt and format the backup device
    Init,
}

/// Modifiers of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Keep all snapshots instead of applying the retention policy
    pub keep: bool,
    /// Leave the device mounted at the end
    pub no_umount: bool,
}

/// Runs backups for all configured sets
pub struct BackupManager {
    config: Config,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration the manager runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn tools(&self) -> &Tools {
        &self.config.tools
    }

    /// Execute a run and turn the outcome into a process exit status
    ///
    /// Returns 0 on success and 1 after logging the failure.
    pub fn run(&self, mode: Mode, options: &RunOptions) -> i32 {
        match self.try_run(mode, options) {
            Ok(()) => 0,
            Err(e) => {
                report(&e);
                1
            }
        }
    }

    /// Execute a run, stopping at the first error
    pub fn try_run(&self, mode: Mode, options: &RunOptions) -> BtrarchResult<()> {
        match mode {
            Mode::Init => device::init(self.tools(), &self.config.destination),
            Mode::Clean => self.clean_local().map(|_| ()),
            Mode::Backup => {
                let (date, today) = run_stamps(chrono::Local::now().naive_local());
                self.backup_run(&date, today, options)
            }
        }
    }

    /// Mount, back up all sets, unmount
    ///
    /// The device is not unmounted when a set fails.
    pub fn backup_run(
        &self,
        date: &SnapshotId,
        today: NaiveDate,
        options: &RunOptions,
    ) -> BtrarchResult<()> {
        device::mount(self.tools(), &self.config.destination)?;

        for set in &self.config.source {
            self.backup_set(set, date, today, options.keep)?;
        }

        if !options.no_umount {
            device::umount(self.tools(), &self.config.destination)?;
        }
        Ok(())
    }

    /// Snapshot and send one set, then apply retention to both locations
    pub fn backup_set(
        &self,
        set: &BackupSet,
        date: &SnapshotId,
        today: NaiveDate,
        keep: bool,
    ) -> BtrarchResult<()> {
        ensure_dir(&set.local_dir())?;
        ensure_dir(&set.remote_dir())?;

        let reference = snapshot::latest(&set.snapshot_dir, &set.name)?;
        snapshot::backup(self.tools(), date, reference.as_ref(), set)?;

        if !keep {
            let policy = &self.config.retention;
            cleanup(self.tools(), &set.snapshot_dir, &set.name, policy, today)?;
            cleanup(self.tools(), &set.destination, &set.name, policy, today)?;
        }
        Ok(())
    }

    /// Delete every local snapshot except the newest of each set
    pub fn clean_local(&self) -> BtrarchResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for set in &self.config.source {
            removed.extend(clean(self.tools(), &set.snapshot_dir, &set.name, |ids| {
                ids[..ids.len().saturating_sub(1)].to_vec()
            })?);
        }
        Ok(removed)
    }
}

/// Delete the snapshots of `dir/name` picked by `selector`
///
/// The selector receives the snapshots sorted oldest first. Returns the
/// paths that were removed.
pub fn clean<F>(tools: &Tools, dir: &Path, name: &str, selector: F) -> BtrarchResult<Vec<PathBuf>>
where
    F: FnOnce(&[SnapshotId]) -> Vec<SnapshotId>,
{
    let ids = snapshot::list(dir, name)?;
    let mut removed = Vec::new();

    for id in selector(&ids) {
        let path = dir.join(name).join(id.as_str());
        info!("Removing snapshot: {}", path.display());
        delete_subvolume(tools, &path)?;
        removed.push(path);
    }

    Ok(removed)
}

/// Delete the snapshots of `dir/name` that `policy` marks as outdated
pub fn cleanup(
    tools: &Tools,
    dir: &Path,
    name: &str,
    policy: &RetentionPolicy,
    today: NaiveDate,
) -> BtrarchResult<Vec<PathBuf>> {
    clean(tools, dir, name, |ids| snapshot::outdated(ids, policy, today))
}

/// Snapshot id and retention reference day of a run started at `now`
///
/// Both come from the same clock reading so a run straddling midnight does
/// not name its snapshots after one day and prune relative to the next.
fn run_stamps(now: NaiveDateTime) -> (SnapshotId, NaiveDate) {
    (SnapshotId::from_datetime(now), now.date())
}

fn ensure_dir(path: &Path) -> BtrarchResult<()> {
    fs::create_dir_all(path).map_err(|e| {
        BtrarchError::Io(format!("Failed to create directory {}: {}", path.display(), e))
    })
}

/// Log a failed run as a single line plus the failing tool's output
fn report(err: &BtrarchError) {
    if err.is_command_failure() {
        error!(
            "Call failed: {}, Output: {}",
            err,
            err.captured_output().unwrap_or_default()
        );
    } else {
        error!("{}", err);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::models::{DeviceBinding, RetentionTier};
    use crate::testing::{fake_btrfs, fake_tool, FakeBtrfs};
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        manager: BackupManager,
    }

    impl Fixture {
        fn new(behaviour: FakeBtrfs, retention: RetentionPolicy) -> Self {
            let temp = TempDir::new().unwrap();
            let dir = temp.path();

            let tools = Tools {
                cryptsetup: fake_tool(dir, "cryptsetup", 0),
                mount: fake_tool(dir, "mount", 0),
                umount: fake_tool(dir, "umount", 0),
                mkfs: fake_tool(dir, "mkfs", 0),
                ..fake_btrfs(dir, behaviour)
            };

            let mut source = Vec::new();
            for name in ["home", "slash"] {
                let path = dir.join("src").join(name);
                fs::create_dir_all(&path).unwrap();
                source.push(BackupSet {
                    path,
                    name: name.to_string(),
                    snapshot_dir: dir.join("snapshot"),
                    destination: dir.join("backup"),
                });
            }

            let config = Config {
                destination: DeviceBinding {
                    device: "/dev/sdz".into(),
                    mapper_name: "backup".into(),
                    mount_point: dir.join("mnt"),
                },
                source,
                retention,
                tools,
            };

            Self {
                temp,
                manager: BackupManager::new(config),
            }
        }

        fn log(&self, name: &str) -> String {
            fs::read_to_string(self.temp.path().join(format!("{}.log", name))).unwrap_or_default()
        }

        fn set(&self, i: usize) -> &BackupSet {
            &self.manager.config().source[i]
        }

        fn seed(&self, i: usize, ids: &[&str]) {
            for id in ids {
                fs::create_dir_all(self.set(i).local_dir().join(id)).unwrap();
                fs::create_dir_all(self.set(i).remote_dir().join(id)).unwrap();
            }
        }

        fn local(&self, i: usize) -> Vec<String> {
            let set = self.set(i);
            snapshot::list(&set.snapshot_dir, &set.name)
                .unwrap()
                .into_iter()
                .map(|id| id.to_string())
                .collect()
        }

        fn remote(&self, i: usize) -> Vec<String> {
            let set = self.set(i);
            snapshot::list(&set.destination, &set.name)
                .unwrap()
                .into_iter()
                .map(|id| id.to_string())
                .collect()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_run_is_full_backup() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        let id: SnapshotId = "2015-11-25T10:00:00.000000".parse().unwrap();

        fx.manager
            .backup_run(&id, date(2015, 11, 25), &RunOptions::default())
            .unwrap();

        for i in 0..2 {
            assert_eq!(fx.local(i), vec![id.to_string()]);
            assert_eq!(fx.remote(i), vec![id.to_string()]);
        }
        assert!(!fx.log("btrfs").contains(" -p "));
        assert!(fx.log("cryptsetup").contains("luksOpen"));
        assert!(fx.log("cryptsetup").contains("luksClose"));
        assert!(!fx.log("umount").is_empty());
    }

    #[test]
    fn test_second_run_is_incremental() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2015-11-24T10:00:00.000000"]);
        let id: SnapshotId = "2015-11-25T10:00:00.000000".parse().unwrap();

        fx.manager
            .backup_run(&id, date(2015, 11, 25), &RunOptions::default())
            .unwrap();

        let reference = fx.set(0).local_dir().join("2015-11-24T10:00:00.000000");
        assert!(fx
            .log("btrfs")
            .contains(&format!("send -p {}", reference.display())));
    }

    #[test]
    fn test_retention_prunes_both_locations() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2010-01-01", "2015-12-25", "2015-12-28"]);
        let id: SnapshotId = "2015-12-31T10:00:00.000000".parse().unwrap();

        fx.manager
            .backup_run(&id, date(2015, 12, 31), &RunOptions::default())
            .unwrap();

        let expected = vec!["2015-12-25", "2015-12-28", "2015-12-31T10:00:00.000000"];
        assert_eq!(fx.local(0), expected);
        assert_eq!(fx.remote(0), expected);
    }

    #[test]
    fn test_keep_skips_retention() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2010-01-01"]);
        let id: SnapshotId = "2015-12-31T10:00:00.000000".parse().unwrap();
        let options = RunOptions {
            keep: true,
            no_umount: true,
        };

        fx.manager.backup_run(&id, date(2015, 12, 31), &options).unwrap();

        assert_eq!(fx.local(0).len(), 2);
        assert!(!fx.log("btrfs").contains("delete"));
        assert!(fx.log("umount").is_empty());
    }

    #[test]
    fn test_failure_stops_run_and_leaves_device_mounted() {
        let fx = Fixture::new(
            FakeBtrfs {
                receive_exit: 1,
                ..FakeBtrfs::default()
            },
            RetentionPolicy::default(),
        );
        let id: SnapshotId = "2015-12-31T10:00:00.000000".parse().unwrap();

        let err = fx
            .manager
            .backup_run(&id, date(2015, 12, 31), &RunOptions::default())
            .unwrap_err();

        assert!(matches!(err, BtrarchError::ReceiveFailed { .. }));
        // The local snapshot of the first set is orphaned, the second set
        // is never attempted.
        assert_eq!(fx.local(0).len(), 1);
        assert!(fx.local(1).is_empty());
        assert!(fx.log("umount").is_empty());
    }

    #[test]
    fn test_run_exit_status() {
        let fx = Fixture::new(
            FakeBtrfs {
                send_exit: 1,
                ..FakeBtrfs::default()
            },
            RetentionPolicy::empty(),
        );
        assert_eq!(fx.manager.run(Mode::Backup, &RunOptions::default()), 1);

        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::empty());
        assert_eq!(fx.manager.run(Mode::Backup, &RunOptions::default()), 0);
    }

    #[test]
    fn test_clean_only_keeps_newest_per_set() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2015-01-01", "2015-06-01", "2015-12-01"]);
        fx.seed(1, &["2014-01-01"]);

        assert_eq!(fx.manager.run(Mode::Clean, &RunOptions::default()), 0);

        assert_eq!(fx.local(0), vec!["2015-12-01"]);
        assert_eq!(fx.local(1), vec!["2014-01-01"]);
        // Received copies and the device are left alone.
        assert_eq!(fx.remote(0).len(), 3);
        assert!(fx.log("cryptsetup").is_empty());
    }

    #[test]
    fn test_clean_without_snapshots() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        assert!(fx.manager.clean_local().unwrap().is_empty());
    }

    #[test]
    fn test_cleanup_uses_policy() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2015-12-20", "2015-12-21", "2015-12-22", "2015-12-30"]);
        let set = fx.set(0);
        let policy = RetentionPolicy::new(vec![RetentionTier::new(1, 1), RetentionTier::new(6, 1)]);

        let removed = cleanup(
            &fx.manager.config().tools,
            &set.snapshot_dir,
            &set.name,
            &policy,
            date(2015, 12, 31),
        )
        .unwrap();

        // Everything before the 6 day cut is dropped.
        assert_eq!(removed.len(), 3);
        assert_eq!(fx.local(0), vec!["2015-12-30"]);
    }

    #[test]
    fn test_init_mode_does_not_touch_snapshots() {
        let fx = Fixture::new(FakeBtrfs::default(), RetentionPolicy::default());
        fx.seed(0, &["2015-01-01", "2015-06-01"]);

        assert_eq!(fx.manager.run(Mode::Init, &RunOptions::default()), 0);

        assert!(fx.log("cryptsetup").contains("luksFormat /dev/sdz"));
        assert_eq!(fx.log("mkfs").trim(), "/dev/mapper/backup");
        assert_eq!(fx.local(0).len(), 2);
    }

    #[test]
    fn test_run_stamps_share_one_day() {
        let now = date(2016, 12, 31).and_hms_micro_opt(23, 59, 59, 999_999).unwrap();
        let (id, today) = run_stamps(now);

        assert_eq!(id.as_str(), "2016-12-31T23:59:59.999999");
        assert_eq!(today, date(2016, 12, 31));
        assert!(id.as_str().starts_with(&today.to_string()));
    }
}
