//! Domain types shared across the Tetherclock crates.
//!
//! Everything here is plain process-local data. Devices and snapshots are
//! rebuilt from scratch on every poll or sync attempt; nothing is cached
//! across attempts.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Connection state of a bridged device, as reported by the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// Attached, authorized and shell-capable.
    Device,
    /// Attached but the user has not accepted the authorization prompt.
    Unauthorized,
    /// Known to the bridge but currently unreachable.
    Offline,
    /// Any other state token the bridge may emit.
    Other(String),
}

impl DeviceState {
    /// Parse a raw state token from a bridge listing line.
    pub fn from_token(token: &str) -> Self {
        match token {
            "device" => DeviceState::Device,
            "unauthorized" => DeviceState::Unauthorized,
            "offline" => DeviceState::Offline,
            other => DeviceState::Other(other.to_owned()),
        }
    }

    /// True when the device is authorized and online.
    pub fn is_online(&self) -> bool {
        matches!(self, DeviceState::Device)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Device => write!(f, "device"),
            DeviceState::Unauthorized => write!(f, "unauthorized"),
            DeviceState::Offline => write!(f, "offline"),
            DeviceState::Other(token) => write!(f, "{token}"),
        }
    }
}

/// One entry of a bridge listing. Ephemeral; identity is serial equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub serial: String,
    pub state: DeviceState,
}

impl Device {
    pub fn new(serial: impl Into<String>, state_token: &str) -> Self {
        Self {
            serial: serial.into(),
            state: DeviceState::from_token(state_token),
        }
    }
}

// ---------------------------------------------------------------------------
// UTC offset
// ---------------------------------------------------------------------------

/// The input did not look like a `+HHMM`/`-HHMM` offset.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid UTC offset '{0}'; expected +HHMM or -HHMM")]
pub struct InvalidUtcOffset(pub String);

/// A `+HHMM`/`-HHMM` UTC offset as reported by the device.
///
/// Parsed into sign/hours/minutes rather than carried as a raw string, so
/// callers can reason about whole-hour offsets without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtcOffset {
    negative: bool,
    hours: u8,
    minutes: u8,
}

impl UtcOffset {
    pub fn new(negative: bool, hours: u8, minutes: u8) -> Self {
        Self {
            negative,
            hours,
            minutes,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    /// Whether the offset is a whole number of hours.
    pub fn is_whole_hours(&self) -> bool {
        self.minutes == 0
    }

    /// Canonical `+HHMM`/`-HHMM` form, used as a lookup key for the static
    /// offset tables.
    pub fn as_hhmm(&self) -> String {
        self.to_string()
    }
}

impl FromStr for UtcOffset {
    type Err = InvalidUtcOffset;

    /// Accepts the first five characters of a trimmed probe response; the
    /// device may append trailing noise after the offset itself.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '\r').collect();
        let bytes = cleaned.as_bytes();
        if bytes.len() < 5 || (bytes[0] != b'+' && bytes[0] != b'-') {
            return Err(InvalidUtcOffset(s.to_owned()));
        }
        if !bytes[1..5].iter().all(u8::is_ascii_digit) {
            return Err(InvalidUtcOffset(s.to_owned()));
        }
        let hours = cleaned[1..3].parse().map_err(|_| InvalidUtcOffset(s.to_owned()))?;
        let minutes = cleaned[3..5].parse().map_err(|_| InvalidUtcOffset(s.to_owned()))?;
        Ok(Self {
            negative: bytes[0] == b'-',
            hours,
            minutes,
        })
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { '-' } else { '+' };
        write!(f, "{sign}{:02}{:02}", self.hours, self.minutes)
    }
}

// ---------------------------------------------------------------------------
// Phone snapshot
// ---------------------------------------------------------------------------

/// Time and zone data read from the device within a single sync attempt.
///
/// Built fresh each attempt; a sync decision never acts on data from a
/// previous cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneSnapshot {
    pub epoch_seconds: i64,
    pub utc_offset: Option<UtcOffset>,
    pub iana_zone: Option<String>,
}

// ---------------------------------------------------------------------------
// Host clock
// ---------------------------------------------------------------------------

/// Source of the host's current epoch seconds. A trait so the sync policy
/// can be exercised against a fixed clock in tests.
pub trait HostClock {
    fn epoch_now(&self) -> i64;
}

/// The real host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl HostClock for SystemClock {
    fn epoch_now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag observed at poll and sleep boundaries.
///
/// Signal handlers flip it; the authorization gate and the scheduler loop
/// check it between blocking steps. In-flight child processes are allowed
/// to finish or die with the process.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
