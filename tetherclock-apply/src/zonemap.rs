//! Static timezone translation tables and the fixed-offset fallback.
//!
//! These are replaceable data assets, not dispatch logic: plain slices of
//! string pairs, looked up by exact match.

use tetherclock_core::types::UtcOffset;

/// IANA zone id → Windows named-timezone identifier, for the common zones.
pub const IANA_TO_WINDOWS: &[(&str, &str)] = &[
    ("UTC", "UTC"),
    ("Etc/UTC", "UTC"),
    ("America/Los_Angeles", "Pacific Standard Time"),
    ("America/Denver", "Mountain Standard Time"),
    ("America/Chicago", "Central Standard Time"),
    ("America/New_York", "Eastern Standard Time"),
    ("America/Phoenix", "US Mountain Standard Time"),
    ("America/Anchorage", "Alaskan Standard Time"),
    ("Pacific/Honolulu", "Hawaiian Standard Time"),
    ("Europe/London", "GMT Standard Time"),
    ("Europe/Berlin", "W. Europe Standard Time"),
    ("Europe/Paris", "Romance Standard Time"),
    ("Europe/Madrid", "Romance Standard Time"),
    ("Europe/Rome", "W. Europe Standard Time"),
    ("Europe/Warsaw", "Central European Standard Time"),
    ("Europe/Moscow", "Russian Standard Time"),
    ("Asia/Tehran", "Iran Standard Time"),
    ("Asia/Jerusalem", "Israel Standard Time"),
    ("Asia/Tokyo", "Tokyo Standard Time"),
    ("Asia/Seoul", "Korea Standard Time"),
    ("Asia/Shanghai", "China Standard Time"),
    ("Asia/Hong_Kong", "China Standard Time"),
    ("Asia/Kolkata", "India Standard Time"),
    ("Asia/Kathmandu", "Nepal Standard Time"),
    ("Australia/Sydney", "AUS Eastern Standard Time"),
    ("Australia/Perth", "W. Australia Standard Time"),
    ("America/Sao_Paulo", "E. South America Standard Time"),
    ("America/Bogota", "SA Pacific Standard Time"),
    ("Africa/Cairo", "Egypt Standard Time"),
    ("Africa/Johannesburg", "South Africa Standard Time"),
];

/// `+HHMM` offset string → Windows identifier, for a short list of common
/// offsets. Consulted only when the IANA table has no entry.
pub const OFFSET_TO_WINDOWS: &[(&str, &str)] = &[
    ("-0800", "Pacific Standard Time"),
    ("-0700", "Mountain Standard Time"),
    ("-0600", "Central Standard Time"),
    ("-0500", "Eastern Standard Time"),
    ("+0000", "UTC"),
    ("+0100", "W. Europe Standard Time"),
    ("+0200", "South Africa Standard Time"),
    ("+0300", "Russian Standard Time"),
    ("+0330", "Iran Standard Time"),
    ("+0530", "India Standard Time"),
    ("+0900", "Tokyo Standard Time"),
];

/// Resolve the Windows timezone identifier for a zone/offset pair: zone
/// table first, offset table second, none when neither matches.
pub fn windows_timezone_for(
    zone: Option<&str>,
    offset: Option<&UtcOffset>,
) -> Option<&'static str> {
    if let Some(zone) = zone {
        if let Some((_, target)) = IANA_TO_WINDOWS.iter().find(|(iana, _)| *iana == zone) {
            return Some(target);
        }
    }
    let offset = offset?.as_hhmm();
    OFFSET_TO_WINDOWS
        .iter()
        .find(|(key, _)| *key == offset)
        .map(|(_, target)| *target)
}

/// Map a whole-hour offset to an `Etc/GMT` zone identifier.
///
/// POSIX fixed-offset naming inverts the sign: `+0800` → `Etc/GMT-8`,
/// `-0300` → `Etc/GMT+3`. Offsets with nonzero minutes have no fixed-offset
/// zone and map to none.
pub fn etc_gmt_zone(offset: &UtcOffset) -> Option<String> {
    if !offset.is_whole_hours() {
        return None;
    }
    let inverted = if offset.is_negative() {
        i32::from(offset.hours())
    } else {
        -i32::from(offset.hours())
    };
    Some(format!("Etc/GMT{inverted:+}"))
}
