use std::process::Command;

use anyhow::{Context, Result, bail};

/// Mount state queries and changes for a mount point listed in fstab.
pub trait MountControl {
    fn is_mounted(&self, mount_point: &str) -> Result<bool>;
    fn mount(&self, mount_point: &str) -> Result<()>;
    fn umount(&self, mount_point: &str) -> Result<()>;
}

/// Runs `mountpoint`, `mount` and `umount` from `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMount;

impl MountControl for SystemMount {
    fn is_mounted(&self, mount_point: &str) -> Result<bool> {
        require_mount_point(mount_point)?;
        let status = Command::new("mountpoint")
            .args(["-q", mount_point])
            .status()
            .context("running mountpoint")?;
        Ok(status.success())
    }

    fn mount(&self, mount_point: &str) -> Result<()> {
        require_mount_point(mount_point)?;
        run_checked("mount", mount_point)
    }

    fn umount(&self, mount_point: &str) -> Result<()> {
        require_mount_point(mount_point)?;
        run_checked("umount", mount_point)
    }
}

fn require_mount_point(mount_point: &str) -> Result<()> {
    if mount_point.trim().is_empty() {
        bail!("expected a non-empty mount point");
    }
    Ok(())
}

fn run_checked(program: &str, mount_point: &str) -> Result<()> {
    let output = Command::new(program)
        .arg(mount_point)
        .output()
        .with_context(|| format!("running {program} {mount_point}"))?;
    if !output.status.success() {
        bail!(
            "failed to {program} \"{mount_point}\" ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
