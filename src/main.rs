use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use btrarch::backup::{BackupManager, Mode, RunOptions};
use btrarch::config::{Config, ConfigPaths};
use btrarch::logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "btrarch",
    version,
    about = "Incrementally backup BTRFS filesystems",
    long_about = "btrarch snapshots btrfs subvolumes, sends them incrementally to an \
                  encrypted backup device and thins out old snapshots on both sides \
                  with a tiered retention policy."
)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, value_name = "FILE", env = "BTRARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Remove all local snapshots except the latest
    #[arg(long, conflicts_with = "init")]
    clean: bool,

    /// Print debug log messages
    #[arg(long)]
    debug: bool,

    /// Initialize destination device (crypt, mkfs ...)
    #[arg(long)]
    init: bool,

    /// Keep all snapshots, don't apply retentions
    #[arg(long)]
    keep: bool,

    /// Log all messages into FILE
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "backup.log"
    )]
    log: Option<PathBuf>,

    /// Don't unmount the backup device at the end
    #[arg(long)]
    no_umount: bool,

    /// Silence output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.init {
            Mode::Init
        } else if self.clean {
            Mode::Clean
        } else {
            Mode::Backup
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            keep: self.keep,
            no_umount: self.no_umount,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let guard = init_logging(&LoggingConfig::from_flags(
        cli.debug,
        cli.quiet,
        cli.log.clone(),
    ))?;
    info!(
        "Started at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let paths = match &cli.config {
        Some(path) => ConfigPaths::with_config_file(path)?,
        None => ConfigPaths::new()?,
    };
    let config = Config::load(paths.config_file())
        .with_context(|| format!("Failed to load {}", paths.config_file().display()))?;

    let manager = BackupManager::new(config);
    let code = manager.run(cli.mode(), &cli.options());

    // Flush the log file before exiting
    drop(guard);
    std::process::exit(code);
}
