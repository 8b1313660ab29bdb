//! `tetherclock device [N]` — pin a device selection.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use tetherclock_bridge::{AdbBridge, Bridge};
use tetherclock_core::config;

use super::list::print_devices;

/// Arguments for `tetherclock device`.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// 1-based index from `tetherclock list`; omit to print the listing.
    pub index: Option<usize>,
}

impl DeviceArgs {
    pub fn run(self) -> Result<ExitCode> {
        let bridge = AdbBridge::detect()?;
        let devices = bridge.list_devices()?;

        if devices.is_empty() {
            println!("No devices found. Connect one or use ADB_CONNECT=host:port.");
            return Ok(ExitCode::FAILURE);
        }

        let Some(index) = self.index else {
            print_devices(&devices);
            return Ok(ExitCode::SUCCESS);
        };

        if index < 1 || index > devices.len() {
            println!("Invalid device number; run `tetherclock list` first.");
            return Ok(ExitCode::FAILURE);
        }

        let serial = devices[index - 1].serial.clone();
        let mut selection = config::load().unwrap_or_default();
        selection.selected_serial = Some(serial.clone());
        config::save(&selection).context("failed to persist device selection")?;

        println!("Selected device: {serial}");
        Ok(ExitCode::SUCCESS)
    }
}
