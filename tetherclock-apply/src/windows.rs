//! Windows-like applier: powershell Set-TimeZone / Set-Date with the w32time
//! service paused around the clock write.

use std::process::{Command, Output};

use tracing::{info, warn};

use tetherclock_core::types::UtcOffset;

use crate::zonemap;
use crate::Applier;

/// Applier for Windows hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsApplier;

impl Applier for WindowsApplier {
    fn apply_timezone(&self, zone: Option<&str>, offset: Option<&UtcOffset>) -> bool {
        let Some(target) = zonemap::windows_timezone_for(zone, offset) else {
            info!("host timezone unchanged (no mapping for device zone/offset)");
            return false;
        };

        // Only the explicit OK marker counts as success; Set-TimeZone error
        // text otherwise still exits 0 through the catch arm.
        let script = format!(
            "try {{ Set-TimeZone -Id '{target}' -ErrorAction Stop; 'OK' }} catch {{ 'ERR:' + $_ }}"
        );
        match powershell(&script) {
            Ok(output)
                if output.status.success()
                    && String::from_utf8_lossy(&output.stdout).contains("OK") =>
            {
                info!(timezone = target, "host timezone set");
                true
            }
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = if stdout.trim().is_empty() { stderr } else { stdout };
                warn!(timezone = target, detail = %detail.trim(), "failed to set host timezone");
                false
            }
            Err(err) => {
                warn!(timezone = target, error = %err, "failed to invoke powershell");
                false
            }
        }
    }

    fn apply_epoch(&self, epoch_seconds: i64) -> bool {
        // The time service fights manual clock writes; stop it first and
        // restart it regardless of how the write went.
        let _ = powershell("Stop-Service w32time -ErrorAction SilentlyContinue");

        let script = format!(
            "$u={epoch_seconds}; \
             $t=[DateTimeOffset]::FromUnixTimeSeconds($u).LocalDateTime; \
             Set-Date -Date $t"
        );
        let ok = match powershell(&script) {
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
                warn!(epoch_seconds, error = %err, "failed to invoke powershell");
                false
            }
        };

        let _ = powershell("Start-Service w32time -ErrorAction SilentlyContinue");

        ok
    }
}

fn powershell(script: &str) -> std::io::Result<Output> {
    Command::new("powershell")
        .args(["-NoProfile", "-Command", script])
        .output()
}

// ---------------------------------------------------------------------------
// Elevation
// ---------------------------------------------------------------------------

/// Relaunch through `Start-Process -Verb RunAs` when not already admin.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsElevator;

#[cfg(windows)]
impl crate::Elevate for WindowsElevator {
    fn ensure_elevated(&self) -> Result<(), crate::ApplyError> {
        if is_admin() {
            return Ok(());
        }

        let exe = std::env::current_exe()?;
        let args: Vec<String> = std::env::args().skip(1).collect();
        let arg_list = args
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");

        let mut script = format!("Start-Process -Verb RunAs -FilePath '{}'", exe.display());
        if !arg_list.is_empty() {
            script.push_str(&format!(" -ArgumentList {arg_list}"));
        }

        info!("relaunching with elevated privileges");
        match powershell(&script) {
            Ok(output) if output.status.success() => {
                // The elevated copy owns the work from here.
                std::process::exit(0);
            }
            Ok(output) => Err(crate::ApplyError::Elevation(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            )),
            Err(err) => Err(crate::ApplyError::Elevation(err.to_string())),
        }
    }
}

#[cfg(windows)]
fn is_admin() -> bool {
    let script = "[Security.Principal.WindowsPrincipal]::new(\
                  [Security.Principal.WindowsIdentity]::GetCurrent())\
                  .IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator)";
    powershell(script)
        .map(|output| String::from_utf8_lossy(&output.stdout).contains("True"))
        .unwrap_or(false)
}
