//! `tetherclock resync` — blocking one-shot sync.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use tetherclock_bridge::{gate, listing, reader, AdbBridge, Bridge};
use tetherclock_core::config;
use tetherclock_core::types::CancelToken;
use tetherclock_daemon::{Settings, SyncDeps};
use tetherclock_sync::sync_once;

/// Arguments for `tetherclock resync`.
#[derive(Args, Debug, Default)]
pub struct ResyncArgs {
    /// Sync against this serial, bypassing discovery order.
    #[arg(long)]
    pub serial: Option<String>,
}

impl ResyncArgs {
    pub fn run(self, settings: &Settings) -> Result<ExitCode> {
        let bridge = AdbBridge::detect()?;
        let saved = config::load().unwrap_or_default().selected_serial;

        let devices = bridge.list_devices()?;
        let mut serial = listing::resolve_serial(self.serial.as_deref(), saved.as_deref(), &devices);

        if serial.is_none() {
            println!("No devices detected; waiting for one...");
            bridge.wait_for_any_device();
            let devices = bridge.list_devices()?;
            serial = listing::resolve_serial(None, saved.as_deref(), &devices);
        }

        let Some(serial) = serial else {
            println!("Still no device.");
            return Ok(ExitCode::FAILURE);
        };

        println!(
            "Using device: {serial} ({})",
            reader::device_model(&bridge, &serial)
        );
        gate::await_authorized(&bridge, &serial, &CancelToken::new(), gate::POLL_INTERVAL)?;

        let deps = SyncDeps::host();
        match sync_once(
            &bridge,
            deps.applier.as_ref(),
            deps.privilege.as_ref(),
            deps.clock.as_ref(),
            &serial,
            settings.drift_threshold,
        ) {
            Ok(report) if report.succeeded() => Ok(ExitCode::SUCCESS),
            Ok(_) => Ok(ExitCode::FAILURE),
            Err(err) => {
                eprintln!("error: {err}");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
