//! The discovery-window / refresh state machine.
//!
//! Two phases for the process lifetime: `Discovering` until the first
//! confirmed sync, bounded by the startup window; `Refreshing` afterwards,
//! unbounded. Giving up inside the window is a deliberate "try again next
//! boot", not an error.

use std::time::Duration;

use crate::settings::Settings;

/// Scheduler phase. Reset only by process restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No confirmed success yet; bounded by the startup window.
    Discovering,
    /// At least one confirmed success; periodic, unbounded.
    Refreshing,
}

/// What the loop should do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sleep(Duration),
    /// The startup window elapsed without a success: exit 0 until next boot.
    GiveUp,
}

/// Pure decision core driven by the runtime loop.
#[derive(Debug, Clone)]
pub struct Scheduler {
    discovery_interval: Duration,
    refresh_interval: Duration,
    startup_window: Duration,
    phase: Phase,
}

impl Scheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            discovery_interval: settings.discovery_interval,
            refresh_interval: settings.refresh_interval,
            startup_window: settings.startup_window,
            phase: Phase::Discovering,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A sync attempt was confirmed successful.
    pub fn record_success(&mut self) {
        self.phase = Phase::Refreshing;
    }

    /// Decide the next step given whether the iteration saw any devices and
    /// the time elapsed since process start.
    ///
    /// The startup deadline is only consulted while discovering; once a
    /// success has been recorded it is never re-checked. A device that
    /// vanishes after a success is polled at the discovery interval (it
    /// cannot be refreshed while absent) but the loop stays in `Refreshing`.
    pub fn after_iteration(&self, devices_present: bool, elapsed: Duration) -> Step {
        match self.phase {
            Phase::Refreshing => {
                if devices_present {
                    Step::Sleep(self.refresh_interval)
                } else {
                    Step::Sleep(self.discovery_interval)
                }
            }
            Phase::Discovering => {
                if elapsed >= self.startup_window {
                    Step::GiveUp
                } else {
                    Step::Sleep(self.discovery_interval)
                }
            }
        }
    }
}
