//! Device-bridge capability for Tetherclock.
//!
//! The bridge is an external command-line tool (`adb`) that enumerates
//! attached devices and runs shell commands on a selected one. This crate
//! wraps it behind the [`Bridge`] trait so the sync policy and the daemon
//! loop can be exercised against scripted fakes.
//!
//! All invocations are blocking child processes with captured output; there
//! is no push notification from the tool, so waiting means polling.

pub mod adb;
pub mod gate;
pub mod listing;
pub mod reader;

mod error;

pub use adb::AdbBridge;
pub use error::BridgeError;

use tetherclock_core::types::Device;

// ---------------------------------------------------------------------------
// Capability surface
// ---------------------------------------------------------------------------

/// Captured result of one bridge or device-shell invocation.
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    /// Process exit code; `None` when killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// First-line payload with surrounding whitespace and carriage returns
    /// stripped; device shells emit CRLF line endings.
    pub fn stdout_line(&self) -> String {
        self.stdout.trim().chars().filter(|c| *c != '\r').collect()
    }
}

/// The device-bridge capability.
///
/// The production implementation is [`AdbBridge`]; tests substitute scripted
/// fakes. Waiting and connecting are best-effort by contract: their failure
/// surfaces later as an empty listing or a failed probe, never as an error
/// here.
pub trait Bridge {
    /// Enumerate attached devices in listing order. Duplicate serials are
    /// preserved; callers that need a mapping take the last entry.
    fn list_devices(&self) -> Result<Vec<Device>, BridgeError>;

    /// Run `argv` in the device's shell, capturing output.
    fn run_on_device(&self, serial: &str, argv: &[&str]) -> Result<ShellOutput, BridgeError>;

    /// Block until the given serial is attached (best-effort).
    fn wait_for_device(&self, serial: &str);

    /// Block until any device is attached (best-effort).
    fn wait_for_any_device(&self);

    /// Ask the bridge to connect to a network device (idempotent,
    /// best-effort).
    fn connect(&self, hostport: &str);

    /// Ensure the bridge's background server is running (best-effort).
    fn start_server(&self);
}
