//! The boot-cycle loop.
//!
//! Deliberately sequential: one sync attempt in flight at a time, bridge and
//! OS commands as blocking child processes. The async runtime exists for the
//! sleep/shutdown select and the signal listeners; cancellation is observed
//! at every poll and sleep boundary, and an in-flight child process is
//! allowed to finish or die with the process.

use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use tetherclock_apply::{host_applier, host_elevator, Applier, Elevate};
use tetherclock_bridge::{gate, listing, reader, AdbBridge, Bridge, BridgeError};
use tetherclock_core::config;
use tetherclock_core::types::{CancelToken, HostClock, SystemClock};
use tetherclock_sync::sync_once;

use crate::error::DaemonError;
use crate::scheduler::{Scheduler, Step};
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// Loop variant: keep going until a terminal condition, or one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Daemon,
    Oneshot,
}

/// Why the loop ended. All three map to exit status 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A oneshot pass finished.
    Completed,
    /// The startup window elapsed without a successful sync; try again next
    /// boot.
    WindowExpired,
    /// A termination signal was observed.
    Shutdown,
}

/// Host-side collaborators of the sync policy, bundled so tests can swap in
/// fakes wholesale.
pub struct SyncDeps {
    pub applier: Box<dyn Applier>,
    pub privilege: Box<dyn Elevate>,
    pub clock: Box<dyn HostClock>,
}

impl SyncDeps {
    /// The real host: platform applier, platform elevation, system clock.
    pub fn host() -> Self {
        Self {
            applier: host_applier(),
            privilege: host_elevator(),
            clock: Box::new(SystemClock),
        }
    }
}

/// Build the runtime, install signal listeners and drive [`run_loop`] to
/// completion on the current thread.
pub fn start_blocking(
    settings: &Settings,
    mode: RunMode,
    preferred: Option<String>,
) -> Result<LoopExit, DaemonError> {
    let bridge = AdbBridge::detect()?;
    let deps = SyncDeps::host();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(DaemonError::Runtime)?;

    runtime.block_on(async {
        let cancel = CancelToken::new();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        spawn_signal_listeners(shutdown_tx, cancel.clone());
        run_loop(
            &bridge,
            &deps,
            settings,
            mode,
            preferred.as_deref(),
            cancel,
            shutdown_rx,
        )
        .await
    })
}

// ---------------------------------------------------------------------------
// The loop
// ---------------------------------------------------------------------------

/// Drive sync attempts until a terminal condition.
///
/// Any unexpected error inside an iteration is caught here, logged as a
/// warning and treated as a failed attempt; only a missing bridge tool, the
/// startup-window deadline or a shutdown signal ends the loop.
pub async fn run_loop<B: Bridge>(
    bridge: &B,
    deps: &SyncDeps,
    settings: &Settings,
    mode: RunMode,
    preferred: Option<&str>,
    cancel: CancelToken,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<LoopExit, DaemonError> {
    info!(
        discovery_secs = settings.discovery_interval.as_secs(),
        window_secs = settings.startup_window.as_secs(),
        refresh_secs = settings.refresh_interval.as_secs(),
        "daemon started: discovery polling until first success, then periodic refresh"
    );

    bridge.start_server();

    let started = Instant::now();
    let mut scheduler = Scheduler::new(settings);
    let mut last_watched: Option<String> = None;

    loop {
        if cancel.is_cancelled() {
            return Ok(LoopExit::Shutdown);
        }

        let outcome = run_iteration(bridge, deps, settings, preferred, &cancel, &mut last_watched);

        let devices_present = match outcome {
            Ok(IterationOutcome::NoDevices) => {
                if mode == RunMode::Oneshot {
                    info!("no devices attached; oneshot pass complete");
                    return Ok(LoopExit::Completed);
                }
                false
            }
            Ok(IterationOutcome::Attempted { synced }) => {
                if synced {
                    scheduler.record_success();
                }
                if mode == RunMode::Oneshot {
                    return Ok(LoopExit::Completed);
                }
                true
            }
            Err(err @ DaemonError::Bridge(BridgeError::ToolMissing { .. })) => return Err(err),
            Err(DaemonError::Bridge(BridgeError::Cancelled)) => return Ok(LoopExit::Shutdown),
            Err(err) => {
                warn!(error = %err, "iteration failed");
                if mode == RunMode::Oneshot {
                    return Ok(LoopExit::Completed);
                }
                true
            }
        };

        match scheduler.after_iteration(devices_present, started.elapsed()) {
            Step::GiveUp => {
                info!("startup window expired without a successful sync; exiting until next boot");
                return Ok(LoopExit::WindowExpired);
            }
            Step::Sleep(duration) => {
                tokio::select! {
                    _ = sleep(duration) => {}
                    _ = shutdown_rx.recv() => return Ok(LoopExit::Shutdown),
                }
            }
        }
    }
}

enum IterationOutcome {
    NoDevices,
    Attempted { synced: bool },
}

fn run_iteration<B: Bridge>(
    bridge: &B,
    deps: &SyncDeps,
    settings: &Settings,
    preferred: Option<&str>,
    cancel: &CancelToken,
    last_watched: &mut Option<String>,
) -> Result<IterationOutcome, DaemonError> {
    if let Some(target) = &settings.connect_target {
        bridge.connect(target);
    }

    let devices = bridge.list_devices()?;
    if devices.is_empty() {
        return Ok(IterationOutcome::NoDevices);
    }

    // Selection is re-read every iteration; it is written only by the
    // out-of-band `device N` command.
    let saved = config::load().unwrap_or_default().selected_serial;
    let Some(serial) = listing::resolve_serial(preferred, saved.as_deref(), &devices) else {
        return Ok(IterationOutcome::NoDevices);
    };

    if listing::online_count(&devices) > 1 && preferred.is_none() && saved.is_none() {
        info!(
            "multiple authorized devices attached; using the first. Pin one with \
             `tetherclock list` and `tetherclock device N`"
        );
    }

    if last_watched.as_deref() != Some(serial.as_str()) {
        info!(serial = %serial, model = %reader::device_model(bridge, &serial), "watching device");
        *last_watched = Some(serial.clone());
    }

    gate::await_authorized(bridge, &serial, cancel, gate::POLL_INTERVAL)?;

    match sync_once(
        bridge,
        deps.applier.as_ref(),
        deps.privilege.as_ref(),
        deps.clock.as_ref(),
        &serial,
        settings.drift_threshold,
    ) {
        Ok(report) => Ok(IterationOutcome::Attempted {
            synced: report.succeeded(),
        }),
        Err(err) => {
            warn!(serial = %serial, error = %err, "sync attempt failed");
            Ok(IterationOutcome::Attempted { synced: false })
        }
    }
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

fn spawn_signal_listeners(shutdown: broadcast::Sender<()>, cancel: CancelToken) {
    let interrupt_shutdown = shutdown.clone();
    let interrupt_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt; shutting down");
            interrupt_cancel.cancel();
            let _ = interrupt_shutdown.send(());
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                if term.recv().await.is_some() {
                    info!("received termination signal; shutting down");
                    cancel.cancel();
                    let _ = shutdown.send(());
                }
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    });

    #[cfg(not(unix))]
    let _ = (shutdown, cancel);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use tetherclock_apply::ApplyError;
    use tetherclock_core::types::{Device, UtcOffset};
    use tetherclock_bridge::ShellOutput;

    // ── fakes ──────────────────────────────────────────────────────────────

    fn shell_ok(stdout: &str) -> ShellOutput {
        ShellOutput {
            status: Some(0),
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    fn shell_fail() -> ShellOutput {
        ShellOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Listing is always empty.
    struct EmptyBridge;

    impl Bridge for EmptyBridge {
        fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
            Ok(vec![])
        }
        fn run_on_device(&self, _: &str, _: &[&str]) -> Result<ShellOutput, BridgeError> {
            Ok(shell_fail())
        }
        fn wait_for_device(&self, _: &str) {}
        fn wait_for_any_device(&self) {}
        fn connect(&self, _: &str) {}
        fn start_server(&self) {}
    }

    /// One authorized device whose clock reads a fixed epoch; counts sync
    /// attempts via the epoch probe.
    struct OneDeviceBridge {
        epoch: i64,
        epoch_probes: Mutex<usize>,
    }

    impl OneDeviceBridge {
        fn new(epoch: i64) -> Self {
            Self {
                epoch,
                epoch_probes: Mutex::new(0),
            }
        }

        fn sync_attempts(&self) -> usize {
            *self.epoch_probes.lock().unwrap()
        }
    }

    impl Bridge for OneDeviceBridge {
        fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
            Ok(vec![Device::new("abc", "device")])
        }

        fn run_on_device(&self, _serial: &str, argv: &[&str]) -> Result<ShellOutput, BridgeError> {
            match argv {
                ["echo", "ok"] => Ok(shell_ok("ok\n")),
                ["date", "+%s"] => {
                    *self.epoch_probes.lock().unwrap() += 1;
                    Ok(shell_ok(&self.epoch.to_string()))
                }
                _ => Ok(shell_fail()),
            }
        }

        fn wait_for_device(&self, _: &str) {}
        fn wait_for_any_device(&self) {}
        fn connect(&self, _: &str) {}
        fn start_server(&self) {}
    }

    /// Every listing attempt fails with a transient invocation error.
    struct FlakyBridge {
        attempts: Mutex<usize>,
    }

    impl Bridge for FlakyBridge {
        fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
            *self.attempts.lock().unwrap() += 1;
            Err(BridgeError::Invoke {
                command: "adb devices".to_owned(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            })
        }
        fn run_on_device(&self, _: &str, _: &[&str]) -> Result<ShellOutput, BridgeError> {
            Ok(shell_fail())
        }
        fn wait_for_device(&self, _: &str) {}
        fn wait_for_any_device(&self) {}
        fn connect(&self, _: &str) {}
        fn start_server(&self) {}
    }

    struct MissingToolBridge;

    impl Bridge for MissingToolBridge {
        fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
            Err(BridgeError::ToolMissing { tool: "adb" })
        }
        fn run_on_device(&self, _: &str, _: &[&str]) -> Result<ShellOutput, BridgeError> {
            Ok(shell_fail())
        }
        fn wait_for_device(&self, _: &str) {}
        fn wait_for_any_device(&self) {}
        fn connect(&self, _: &str) {}
        fn start_server(&self) {}
    }

    struct YesApplier;
    impl Applier for YesApplier {
        fn apply_timezone(&self, _: Option<&str>, _: Option<&UtcOffset>) -> bool {
            true
        }
        fn apply_epoch(&self, _: i64) -> bool {
            true
        }
    }

    struct NoopElevator;
    impl Elevate for NoopElevator {
        fn ensure_elevated(&self) -> Result<(), ApplyError> {
            Ok(())
        }
    }

    struct FixedClock(i64);
    impl HostClock for FixedClock {
        fn epoch_now(&self) -> i64 {
            self.0
        }
    }

    fn test_deps(host_epoch: i64) -> SyncDeps {
        SyncDeps {
            applier: Box::new(YesApplier),
            privilege: Box::new(NoopElevator),
            clock: Box::new(FixedClock(host_epoch)),
        }
    }

    fn test_settings(discovery: u64, window: u64, refresh: u64) -> Settings {
        Settings {
            discovery_interval: Duration::from_secs(discovery),
            startup_window: Duration::from_secs(window),
            refresh_interval: Duration::from_secs(refresh),
            ..Settings::default()
        }
    }

    // ── scenarios ──────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_window_after_two_discovery_sleeps() {
        let settings = test_settings(5, 10, 600);
        let deps = test_deps(0);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let started = Instant::now();
        let exit = run_loop(
            &EmptyBridge,
            &deps,
            &settings,
            RunMode::Daemon,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .expect("loop");

        assert_eq!(exit, LoopExit::WindowExpired);
        assert_eq!(
            started.elapsed(),
            Duration::from_secs(10),
            "exit lands exactly on the 10-second mark"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_switches_to_refresh_cadence_without_deadline_checks() {
        // Window of zero would give up immediately unless the first success
        // moves the scheduler out of Discovering.
        let settings = test_settings(5, 0, 600);
        let bridge = OneDeviceBridge::new(1_000_000);
        let deps = test_deps(1_000_000);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            sleep(Duration::from_secs(700)).await;
            let _ = shutdown_tx.send(());
        });

        let started = Instant::now();
        let exit = run_loop(
            &bridge,
            &deps,
            &settings,
            RunMode::Daemon,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .expect("loop");

        assert_eq!(exit, LoopExit::Shutdown);
        assert_eq!(
            bridge.sync_attempts(),
            2,
            "one attempt at t=0, one after the 600s refresh sleep"
        );
        assert_eq!(started.elapsed(), Duration::from_secs(700));
    }

    #[tokio::test(start_paused = true)]
    async fn oneshot_without_devices_completes_without_attempting() {
        let settings = test_settings(5, 10, 600);
        let deps = test_deps(0);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let exit = run_loop(
            &EmptyBridge,
            &deps,
            &settings,
            RunMode::Oneshot,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .expect("loop");

        assert_eq!(exit, LoopExit::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn oneshot_with_a_device_attempts_exactly_once() {
        let settings = test_settings(5, 900, 600);
        let bridge = OneDeviceBridge::new(2_000_000);
        let deps = test_deps(2_000_000);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let exit = run_loop(
            &bridge,
            &deps,
            &settings,
            RunMode::Oneshot,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .expect("loop");

        assert_eq!(exit, LoopExit::Completed);
        assert_eq!(bridge.sync_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_tool_is_fatal() {
        let settings = test_settings(5, 10, 600);
        let deps = test_deps(0);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let err = run_loop(
            &MissingToolBridge,
            &deps,
            &settings,
            RunMode::Daemon,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DaemonError::Bridge(BridgeError::ToolMissing { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_never_terminate_the_loop_early() {
        let settings = test_settings(5, 10, 600);
        let bridge = FlakyBridge {
            attempts: Mutex::new(0),
        };
        let deps = test_deps(0);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let exit = run_loop(
            &bridge,
            &deps,
            &settings,
            RunMode::Daemon,
            None,
            CancelToken::new(),
            shutdown_rx,
        )
        .await
        .expect("transient errors are contained");

        assert_eq!(exit, LoopExit::WindowExpired);
        assert_eq!(
            *bridge.attempts.lock().unwrap(),
            3,
            "iterations at t=0, t=5 and t=10, then the deadline fires"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_token_exits_before_any_work() {
        let settings = test_settings(5, 10, 600);
        let bridge = OneDeviceBridge::new(1_000_000);
        let deps = test_deps(1_000_000);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let cancel = CancelToken::new();
        cancel.cancel();

        let exit = run_loop(
            &bridge,
            &deps,
            &settings,
            RunMode::Daemon,
            None,
            cancel,
            shutdown_rx,
        )
        .await
        .expect("loop");

        assert_eq!(exit, LoopExit::Shutdown);
        assert_eq!(bridge.sync_attempts(), 0);
    }
}
