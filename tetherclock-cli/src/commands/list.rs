//! `tetherclock list` — print discovered devices.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use tetherclock_bridge::{AdbBridge, Bridge};
use tetherclock_core::types::{Device, DeviceState};

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "State")]
    state: String,
}

pub fn run() -> Result<ExitCode> {
    let bridge = AdbBridge::detect()?;
    let devices = bridge.list_devices()?;

    if devices.is_empty() {
        println!("No devices found. Connect one or use ADB_CONNECT=host:port.");
        return Ok(ExitCode::FAILURE);
    }

    print_devices(&devices);
    Ok(ExitCode::SUCCESS)
}

/// Render the 1-based listing used by `device N`.
pub fn print_devices(devices: &[Device]) {
    let rows: Vec<DeviceRow> = devices
        .iter()
        .enumerate()
        .map(|(i, device)| DeviceRow {
            index: i + 1,
            serial: device.serial.clone(),
            state: colored_state(&device.state),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn colored_state(state: &DeviceState) -> String {
    let text = state.to_string();
    match state {
        DeviceState::Device => text.green().to_string(),
        DeviceState::Unauthorized => text.yellow().to_string(),
        DeviceState::Offline => text.red().to_string(),
        DeviceState::Other(_) => text,
    }
}
