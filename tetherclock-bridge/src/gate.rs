//! Authorization gate: block until a device is attached, authorized and
//! shell-responsive.

use std::time::Duration;

use tracing::info;

use tetherclock_core::types::CancelToken;

use crate::error::BridgeError;
use crate::{listing, Bridge};

/// Poll cadence while waiting for authorization.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Block until `serial` reports state `device` in the listing AND answers a
/// trivial echo probe with exit 0 and the expected payload.
///
/// There is no timeout here: the scheduler's startup-window accounting
/// bounds the overall wait. The cancellation token is observed at each poll
/// boundary; a listing hiccup counts as "not ready yet", never as an error,
/// since a false-positive "ready" would only surface as downstream command
/// failures.
pub fn await_authorized(
    bridge: &dyn Bridge,
    serial: &str,
    cancel: &CancelToken,
    poll: Duration,
) -> Result<(), BridgeError> {
    bridge.start_server();
    bridge.wait_for_device(serial);

    loop {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        if let Ok(devices) = bridge.list_devices() {
            if listing::state_of(&devices, serial).is_some_and(|state| state.is_online())
                && probe_shell(bridge, serial)
            {
                info!(serial, "device authorized");
                return Ok(());
            }
        }

        std::thread::sleep(poll);
    }
}

fn probe_shell(bridge: &dyn Bridge, serial: &str) -> bool {
    match bridge.run_on_device(serial, &["echo", "ok"]) {
        Ok(output) => output.success() && output.stdout.contains("ok"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use tetherclock_core::types::Device;

    use crate::ShellOutput;

    /// Listing becomes authorized after `ready_after` polls; the echo probe
    /// succeeds whenever the listing does.
    struct RipeningBridge {
        ready_after: usize,
        polls: Mutex<usize>,
    }

    impl Bridge for RipeningBridge {
        fn list_devices(&self) -> Result<Vec<Device>, BridgeError> {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            let state = if *polls > self.ready_after {
                "device"
            } else {
                "unauthorized"
            };
            Ok(vec![Device::new("abc", state)])
        }

        fn run_on_device(&self, _serial: &str, argv: &[&str]) -> Result<ShellOutput, BridgeError> {
            assert_eq!(argv, ["echo", "ok"]);
            Ok(ShellOutput {
                status: Some(0),
                stdout: "ok\r\n".to_owned(),
                stderr: String::new(),
            })
        }

        fn wait_for_device(&self, _serial: &str) {}
        fn wait_for_any_device(&self) {}
        fn connect(&self, _hostport: &str) {}
        fn start_server(&self) {}
    }

    #[test]
    fn returns_once_listed_and_probe_answers() {
        let bridge = RipeningBridge {
            ready_after: 2,
            polls: Mutex::new(0),
        };
        let cancel = CancelToken::new();
        await_authorized(&bridge, "abc", &cancel, Duration::from_millis(1)).expect("authorized");
        assert!(*bridge.polls.lock().unwrap() > 2);
    }

    #[test]
    fn cancelled_token_interrupts_the_wait() {
        let bridge = RipeningBridge {
            ready_after: usize::MAX,
            polls: Mutex::new(0),
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = await_authorized(&bridge, "abc", &cancel, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, BridgeError::Cancelled));
    }
}
