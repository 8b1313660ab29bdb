//! Clock and zone probes against the device shell.
//!
//! Different device shells ship different minimal toolsets, so the epoch
//! read tries progressively more generic fallbacks instead of feature
//! detection. All reads are best-effort: a missing value only narrows what
//! the sync policy can act on.

use tracing::debug;

use tetherclock_core::types::{PhoneSnapshot, UtcOffset};

use crate::Bridge;

/// Epoch probes in fallback order: the plain date utility, the two common
/// minimal-shell multiplexers, then a generic shell invocation.
const EPOCH_PROBES: &[&[&str]] = &[
    &["date", "+%s"],
    &["toybox", "date", "+%s"],
    &["busybox", "date", "+%s"],
    &["sh", "-c", "date +%s"],
];

const ZONE_PROBES: &[&[&str]] = &[
    &["getprop", "persist.sys.timezone"],
    &["settings", "get", "global", "time_zone"],
];

/// Read the device's epoch seconds: first probe whose trimmed stdout is a
/// nonnegative decimal integer under a zero exit code.
pub fn read_epoch(bridge: &dyn Bridge, serial: &str) -> Option<i64> {
    for probe in EPOCH_PROBES {
        let Ok(output) = bridge.run_on_device(serial, probe) else {
            continue;
        };
        let raw = output.stdout_line();
        if output.success() && !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(epoch) = raw.parse() {
                return Some(epoch);
            }
        }
        debug!(serial, probe = %probe.join(" "), "epoch probe failed");
    }
    None
}

/// Read the device's UTC offset via a single `date +%z` probe.
pub fn read_utc_offset(bridge: &dyn Bridge, serial: &str) -> Option<UtcOffset> {
    let output = bridge.run_on_device(serial, &["date", "+%z"]).ok()?;
    if !output.success() {
        return None;
    }
    output.stdout_line().parse().ok()
}

/// Read the device's IANA timezone id: a system property first, then the
/// settings database. The literal string "null" is how the settings probe
/// reports absence, so it is filtered here and only here.
pub fn read_iana_zone(bridge: &dyn Bridge, serial: &str) -> Option<String> {
    for probe in ZONE_PROBES {
        let Ok(output) = bridge.run_on_device(serial, probe) else {
            continue;
        };
        let value = output.stdout_line();
        if output.success() && !value.is_empty() && !value.eq_ignore_ascii_case("null") {
            return Some(value);
        }
    }
    None
}

/// Human-readable model name for log lines; never fails.
pub fn device_model(bridge: &dyn Bridge, serial: &str) -> String {
    match bridge.run_on_device(serial, &["getprop", "ro.product.model"]) {
        Ok(output) => {
            let model = output.stdout_line();
            if model.is_empty() {
                "unknown-model".to_owned()
            } else {
                model
            }
        }
        Err(_) => "unknown-model".to_owned(),
    }
}

/// Build a fresh snapshot for one sync attempt. `None` means the epoch was
/// unreadable, which indicates an unusable device shell; offset and zone
/// are independently optional.
pub fn snapshot(bridge: &dyn Bridge, serial: &str) -> Option<PhoneSnapshot> {
    let epoch_seconds = read_epoch(bridge, serial)?;
    Some(PhoneSnapshot {
        epoch_seconds,
        utc_offset: read_utc_offset(bridge, serial),
        iana_zone: read_iana_zone(bridge, serial),
    })
}
