//! The real bridge: blocking `adb` child processes with captured output.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use tetherclock_core::types::Device;

use crate::error::BridgeError;
use crate::{listing, Bridge, ShellOutput};

/// Bridge implementation backed by the `adb` binary found on PATH.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    program: PathBuf,
}

impl AdbBridge {
    pub const TOOL: &'static str = "adb";

    /// Locate `adb` on PATH. Missing tool is the one fatal environment
    /// condition in the whole system.
    pub fn detect() -> Result<Self, BridgeError> {
        let program =
            which::which(Self::TOOL).map_err(|_| BridgeError::ToolMissing { tool: Self::TOOL })?;
        Ok(Self { program })
    }

    fn invoke(&self, args: &[&str]) -> Result<ShellOutput, BridgeError> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| BridgeError::Invoke {
                command: format!("{} {}", Self::TOOL, args.join(" ")),
                source,
            })?;
        Ok(ShellOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Bridge for AdbBridge {
    fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
        let output = self.invoke(&["devices"])?;
        Ok(listing::parse_devices(&output.stdout))
    }

    fn run_on_device(&self, serial: &str, argv: &[&str]) -> Result<ShellOutput, BridgeError> {
        let mut args = vec!["-s", serial, "shell"];
        args.extend_from_slice(argv);
        self.invoke(&args)
    }

    fn wait_for_device(&self, serial: &str) {
        let _ = self.invoke(&["-s", serial, "wait-for-device"]);
    }

    fn wait_for_any_device(&self) {
        let _ = self.invoke(&["wait-for-device"]);
    }

    fn connect(&self, hostport: &str) {
        match self.invoke(&["connect", hostport]) {
            Ok(output) if !output.success() => {
                debug!(hostport, stderr = %output.stderr.trim(), "bridge connect refused");
            }
            Err(err) => debug!(hostport, error = %err, "bridge connect failed"),
            Ok(_) => {}
        }
    }

    fn start_server(&self) {
        let _ = self.invoke(&["start-server"]);
    }
}
