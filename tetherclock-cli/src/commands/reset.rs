//! `tetherclock reset` — clear the persisted selection.

use std::process::ExitCode;

use anyhow::{Context, Result};

use tetherclock_core::config;

pub fn run() -> Result<ExitCode> {
    config::reset().context("failed to clear configuration")?;
    println!("Configuration cleared.");
    Ok(ExitCode::SUCCESS)
}
