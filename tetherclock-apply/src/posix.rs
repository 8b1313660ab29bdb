//! POSIX-like applier: timedatectl, zoneinfo symlinks and the date utility.

use std::path::Path;
use std::process::{Command, Output};

use tracing::{info, warn};

use tetherclock_core::types::UtcOffset;

use crate::zonemap;
use crate::Applier;

const ZONE_TOOL: &str = "timedatectl";
const ZONEINFO_DIR: &str = "/usr/share/zoneinfo";
const LOCALTIME_LINK: &str = "/etc/localtime";
const ZONE_NAME_FILE: &str = "/etc/timezone";

/// Applier for Linux and friends.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixApplier;

impl PosixApplier {
    fn set_zone_via_tool(&self, zone: &str) -> bool {
        if which::which(ZONE_TOOL).is_err() {
            return false;
        }
        match run_host(ZONE_TOOL, &["set-timezone", zone]) {
            Ok(output) => output.status.success(),
            Err(err) => {
                warn!(zone, error = %err, "timedatectl invocation failed");
                false
            }
        }
    }

    /// Point /etc/localtime at the zoneinfo entry and record the zone name.
    fn link_localtime(&self, zonefile: &Path, zone: &str) -> std::io::Result<()> {
        // ln -sf handles replacing an existing link or regular file.
        let _ = run_host(
            "ln",
            &["-sf", &zonefile.to_string_lossy(), LOCALTIME_LINK],
        )?;
        std::fs::write(ZONE_NAME_FILE, format!("{zone}\n"))
    }
}

impl Applier for PosixApplier {
    fn apply_timezone(&self, zone: Option<&str>, offset: Option<&UtcOffset>) -> bool {
        if let Some(zone) = zone {
            if self.set_zone_via_tool(zone) {
                info!(zone, "host timezone set");
                return true;
            }

            let zonefile = Path::new(ZONEINFO_DIR).join(zone);
            if zonefile.exists() {
                match self.link_localtime(&zonefile, zone) {
                    Ok(()) => {
                        info!(zone, "host timezone set via zoneinfo symlink");
                        return true;
                    }
                    Err(err) => warn!(zone, error = %err, "failed to write timezone link"),
                }
            }
        }

        // Last resort: derive a fixed-offset zone from a whole-hour offset.
        if let Some(offset) = offset {
            if let Some(etc_zone) = zonemap::etc_gmt_zone(offset) {
                if self.set_zone_via_tool(&etc_zone) {
                    info!(zone = %etc_zone, %offset, "host timezone set from offset");
                    return true;
                }
            }
        }

        info!("host timezone unchanged (no usable zone id or offset mapping)");
        false
    }

    fn apply_epoch(&self, epoch_seconds: i64) -> bool {
        let have_zone_tool = which::which(ZONE_TOOL).is_ok();
        if have_zone_tool {
            // Pause network time sync so our setting is not immediately
            // overwritten; fire-and-forget either way.
            let _ = run_host(ZONE_TOOL, &["set-ntp", "false"]);
        }

        let stamp = format!("@{epoch_seconds}");
        let ok = match run_host("date", &["-u", "-s", &stamp]) {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                warn!(
                    epoch_seconds,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "failed to set host clock"
                );
                false
            }
            Err(err) => {
                warn!(epoch_seconds, error = %err, "failed to invoke date");
                false
            }
        };

        if have_zone_tool {
            let _ = run_host(ZONE_TOOL, &["set-ntp", "true"]);
        }

        ok
    }
}

fn run_host(program: &str, args: &[&str]) -> std::io::Result<Output> {
    Command::new(program).args(args).output()
}

// ---------------------------------------------------------------------------
// Elevation
// ---------------------------------------------------------------------------

/// Re-exec through pkexec or sudo when not already root.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixElevator;

#[cfg(unix)]
impl crate::Elevate for PosixElevator {
    fn ensure_elevated(&self) -> Result<(), crate::ApplyError> {
        use std::os::unix::process::CommandExt;

        if unsafe { libc::geteuid() } == 0 {
            return Ok(());
        }

        let exe = std::env::current_exe()?;
        let args: Vec<std::ffi::OsString> = std::env::args_os().skip(1).collect();

        for tool in ["pkexec", "sudo"] {
            if which::which(tool).is_ok() {
                info!(tool, "re-executing with elevated privileges");
                // exec only returns on failure.
                let err = Command::new(tool).arg(&exe).args(&args).exec();
                return Err(crate::ApplyError::Elevation(format!(
                    "exec via {tool} failed: {err}"
                )));
            }
        }

        Err(crate::ApplyError::ElevationUnavailable)
    }
}
