//! Tetherclock — keep the host clock and timezone aligned with a tethered
//! Android device.
//!
//! # Usage
//!
//! ```text
//! tetherclock                 Run the boot-cycle daemon (default)
//! tetherclock run [--serial S]
//! tetherclock oneshot [--serial S]
//! tetherclock resync [--serial S]
//! tetherclock list
//! tetherclock device [N]
//! tetherclock reset
//! ```

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tetherclock_bridge::BridgeError;
use tetherclock_daemon::{logging, DaemonError, RunMode, Settings};

use commands::{device::DeviceArgs, resync::ResyncArgs, run::RunArgs};

/// Distinguished status for a missing device-bridge tool.
const EXIT_TOOL_MISSING: u8 = 127;

const ENV_HELP: &str = "Environment:
  LOG_FILE=/var/log/tetherclock.log   also append log lines to this file
  ADB_CONNECT=host:port               connect to a network device before each poll
  DISCOVERY_INTERVAL=5                poll period (seconds) before the first success
  STARTUP_WINDOW=900                  give-up deadline (seconds) without a success
  REFRESH_INTERVAL=600                steady-state period (seconds) after a success
  DRIFT_THRESHOLD=1                   minimum drift (seconds) that triggers a clock set";

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tetherclock",
    version,
    about = "Sync the host clock and timezone from a tethered Android device",
    after_help = ENV_HELP,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the boot-cycle daemon: a discovery window, then periodic refresh.
    Run(RunArgs),

    /// Perform a single discovery-and-sync pass, then exit.
    Oneshot(RunArgs),

    /// Sync right now, waiting for device authorization.
    Resync(ResyncArgs),

    /// List attached devices.
    List,

    /// Pin the Nth listed device as the sync target (1-based; no N lists).
    Device(DeviceArgs),

    /// Clear the persisted device selection.
    Reset,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();

    if let Err(err) = logging::init(settings.log_file.as_deref()) {
        eprintln!("warning: {err}");
    }

    let result = match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => args.run(RunMode::Daemon, &settings),
        Commands::Oneshot(args) => args.run(RunMode::Oneshot, &settings),
        Commands::Resync(args) => args.run(&settings),
        Commands::List => commands::list::run(),
        Commands::Device(args) => args.run(),
        Commands::Reset => commands::reset::run(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if matches!(
        err.downcast_ref::<BridgeError>(),
        Some(BridgeError::ToolMissing { .. })
    ) {
        return ExitCode::from(EXIT_TOOL_MISSING);
    }
    if matches!(
        err.downcast_ref::<DaemonError>(),
        Some(DaemonError::Bridge(BridgeError::ToolMissing { .. }))
    ) {
        return ExitCode::from(EXIT_TOOL_MISSING);
    }
    ExitCode::FAILURE
}
