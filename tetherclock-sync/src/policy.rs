//! One sync attempt: read the device, evaluate drift, apply.

use std::fmt;

use chrono::DateTime;
use thiserror::Error;
use tracing::{debug, info, warn};

use tetherclock_apply::{Applier, ApplyError, Elevate};
use tetherclock_bridge::{reader, Bridge};
use tetherclock_core::types::HostClock;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Four-way classification of a completed attempt, for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcomeClass {
    FullySynced,
    TimezoneOnly,
    TimeOnly,
    Failed,
}

impl SyncOutcomeClass {
    pub fn from_steps(timezone_applied: bool, time_applied: bool) -> Self {
        match (timezone_applied, time_applied) {
            (true, true) => SyncOutcomeClass::FullySynced,
            (true, false) => SyncOutcomeClass::TimezoneOnly,
            (false, true) => SyncOutcomeClass::TimeOnly,
            (false, false) => SyncOutcomeClass::Failed,
        }
    }
}

impl fmt::Display for SyncOutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcomeClass::FullySynced => write!(f, "host time and timezone updated"),
            SyncOutcomeClass::TimezoneOnly => {
                write!(f, "timezone updated; time unchanged due to error or threshold")
            }
            SyncOutcomeClass::TimeOnly => {
                write!(f, "time updated; timezone unchanged (no mapping or failure)")
            }
            SyncOutcomeClass::Failed => write!(f, "failed to update time and timezone"),
        }
    }
}

/// Result of one attempt. The two applied flags are independent; the time
/// step counts as applied when it was skipped below the drift threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub phone_epoch: i64,
    pub host_epoch: i64,
    pub drift: i64,
    pub timezone_applied: bool,
    pub time_applied: bool,
    /// Whether a real clock write was attempted (drift at or above the
    /// threshold), as opposed to the vacuous skip.
    pub time_attempted: bool,
}

impl SyncReport {
    pub fn succeeded(&self) -> bool {
        self.timezone_applied && self.time_applied
    }

    pub fn outcome(&self) -> SyncOutcomeClass {
        SyncOutcomeClass::from_steps(self.timezone_applied, self.time_applied)
    }
}

/// Errors that fail an attempt outright, before any outcome exists.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No epoch probe answered; the device shell is likely unusable, so the
    /// timezone step is not attempted either.
    #[error("could not read epoch seconds from device '{serial}'")]
    EpochUnavailable { serial: String },

    /// Privilege elevation failed before any mutating call.
    #[error(transparent)]
    Privilege(#[from] ApplyError),
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Perform one sync attempt against `serial`.
///
/// The timezone step always runs; the clock step runs only when the
/// absolute drift reaches `drift_threshold` seconds (inclusive). The two
/// steps never block each other and nothing is rolled back.
pub fn sync_once(
    bridge: &dyn Bridge,
    applier: &dyn Applier,
    privilege: &dyn Elevate,
    clock: &dyn HostClock,
    serial: &str,
    drift_threshold: i64,
) -> Result<SyncReport, SyncError> {
    let Some(snapshot) = reader::snapshot(bridge, serial) else {
        return Err(SyncError::EpochUnavailable {
            serial: serial.to_owned(),
        });
    };

    let host_epoch = clock.epoch_now();
    let drift = snapshot.epoch_seconds - host_epoch;

    info!(
        phone_epoch = snapshot.epoch_seconds,
        host_epoch, drift, "drift evaluated"
    );
    if let Some(when) = DateTime::from_timestamp(snapshot.epoch_seconds, 0) {
        debug!(phone_time_utc = %when.format("%Y-%m-%d %H:%M:%S"), "device wall clock");
    }
    if let Some(zone) = &snapshot.iana_zone {
        info!(zone = %zone, "device timezone");
    }
    if let Some(offset) = &snapshot.utc_offset {
        info!(offset = %offset, "device UTC offset");
    }

    privilege.ensure_elevated()?;

    let timezone_applied =
        applier.apply_timezone(snapshot.iana_zone.as_deref(), snapshot.utc_offset.as_ref());

    let time_attempted = drift.abs() >= drift_threshold;
    let time_applied = if time_attempted {
        applier.apply_epoch(snapshot.epoch_seconds)
    } else {
        info!(drift, "drift below threshold; leaving host clock untouched");
        true
    };

    let report = SyncReport {
        phone_epoch: snapshot.epoch_seconds,
        host_epoch,
        drift,
        timezone_applied,
        time_applied,
        time_attempted,
    };

    if report.succeeded() {
        info!("{}", report.outcome());
    } else {
        warn!("{}", report.outcome());
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
