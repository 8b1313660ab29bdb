//! `tetherclock run` / `tetherclock oneshot` — the scheduler loop.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use tetherclock_daemon::{start_blocking, RunMode, Settings};

/// Arguments shared by `run` and `oneshot`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Sync against this serial, bypassing discovery order.
    #[arg(long)]
    pub serial: Option<String>,
}

impl RunArgs {
    pub fn run(self, mode: RunMode, settings: &Settings) -> Result<ExitCode> {
        // WindowExpired is the deliberate "try again next boot" path and
        // Shutdown is an external stop; both are benign terminations.
        start_blocking(settings, mode, self.serial)?;
        Ok(ExitCode::SUCCESS)
    }
}
