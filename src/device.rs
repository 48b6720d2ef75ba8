//! Encrypted backup device
//!
//! The backup device is a LUKS container holding a btrfs filesystem:
//!
//! ```text
//! cryptsetup luksOpen /dev/disk/by-id/usb-someid backup
//! mount -o noatime /dev/mapper/backup /mnt/backup
//! ```

use std::process::Command;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::error::BtrarchResult;
use crate::models::DeviceBinding;
use crate::process::{run_interactive, run_logged, Tools};

/// Pause between mkfs and luksClose; closing right away can fail with
/// "device-mapper: ioctl: unable to remove open device"
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Unlock the device and mount its filesystem
pub fn mount(tools: &Tools, binding: &DeviceBinding) -> BtrarchResult<()> {
    info!(
        "Mounting {} (named {}) at {}",
        binding.device.display(),
        binding.mapper_name,
        binding.mount_point.display()
    );

    luks_open(tools, binding)?;
    run_logged(
        Command::new(&tools.mount)
            .args(["-o", "noatime"])
            .arg(binding.mapper_path())
            .arg(&binding.mount_point),
    )?;
    Ok(())
}

/// Unmount the filesystem and lock the device again
pub fn umount(tools: &Tools, binding: &DeviceBinding) -> BtrarchResult<()> {
    info!(
        "Unmounting {} at {}",
        binding.mapper_name,
        binding.mount_point.display()
    );

    run_logged(Command::new(&tools.umount).arg(&binding.mount_point))?;
    luks_close(tools, binding)
}

/// Set up encryption and a fresh btrfs on the device
///
/// Destroys whatever the device held before. `luksFormat` runs attached to
/// the terminal so it can ask for confirmation and the passphrase.
pub fn init(tools: &Tools, binding: &DeviceBinding) -> BtrarchResult<()> {
    info!("Initialize encryption on {}", binding.device.display());
    run_interactive(
        Command::new(&tools.cryptsetup)
            .arg("luksFormat")
            .arg(&binding.device),
    )?;

    info!("Opening initialized {}", binding.device.display());
    luks_open(tools, binding)?;

    info!("Creating BTRFS on crypted {}", binding.device.display());
    run_logged(Command::new(&tools.mkfs).arg(binding.mapper_path()))?;

    thread::sleep(SETTLE_DELAY);
    luks_close(tools, binding)
}

fn luks_open(tools: &Tools, binding: &DeviceBinding) -> BtrarchResult<()> {
    run_logged(
        Command::new(&tools.cryptsetup)
            .arg("luksOpen")
            .arg(&binding.device)
            .arg(&binding.mapper_name),
    )?;
    Ok(())
}

fn luks_close(tools: &Tools, binding: &DeviceBinding) -> BtrarchResult<()> {
    run_logged(
        Command::new(&tools.cryptsetup)
            .arg("luksClose")
            .arg(&binding.mapper_name),
    )?;
    Ok(())
}
