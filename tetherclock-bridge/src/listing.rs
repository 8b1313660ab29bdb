//! Listing parsing and target-serial resolution.

use tetherclock_core::types::{Device, DeviceState};

/// Parse the raw `adb devices` output into listing order.
///
/// Skips blank lines, the "List of devices" header, and `*`-prefixed server
/// chatter ("* daemon started successfully"). Duplicate serials are kept.
pub fn parse_devices(text: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }
        let mut parts = line.split_whitespace();
        if let (Some(serial), Some(state)) = (parts.next(), parts.next()) {
            devices.push(Device::new(serial, state));
        }
    }
    devices
}

/// State of `serial` when the listing is read as a mapping: the last entry
/// for a duplicated serial wins.
pub fn state_of<'a>(devices: &'a [Device], serial: &str) -> Option<&'a DeviceState> {
    devices
        .iter()
        .rev()
        .find(|d| d.serial == serial)
        .map(|d| &d.state)
}

/// Number of authorized, online entries.
pub fn online_count(devices: &[Device]) -> usize {
    devices.iter().filter(|d| d.state.is_online()).count()
}

/// Resolve the sync target serial.
///
/// Priority: explicit override (returned unchecked), then the saved
/// selection if still listed, then the first authorized device, then the
/// first listed device of any state, then none. A pinned device is never
/// silently switched away from while it remains attached, but resolution
/// degrades gracefully when it vanishes.
pub fn resolve_serial(
    preferred: Option<&str>,
    saved: Option<&str>,
    devices: &[Device],
) -> Option<String> {
    if let Some(serial) = preferred {
        return Some(serial.to_owned());
    }
    if let Some(saved) = saved {
        if devices.iter().any(|d| d.serial == saved) {
            return Some(saved.to_owned());
        }
    }
    if let Some(online) = devices.iter().find(|d| d.state.is_online()) {
        return Some(online.serial.clone());
    }
    devices.first().map(|d| d.serial.clone())
}
