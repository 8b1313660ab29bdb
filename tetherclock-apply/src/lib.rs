//! Platform appliers: commit a timezone and/or an absolute epoch to the
//! host, each with its own fallback chain.
//!
//! Two strategies exist, selected by host OS. Both honor the same contract:
//! timezone application and time application are independent steps. A
//! failure in one never blocks the other, each reports its own boolean, and
//! nothing is rolled back on failure. Best-effort, not transactional.

pub mod posix;
pub mod windows;
pub mod zonemap;

mod error;

pub use error::ApplyError;

use tetherclock_core::types::UtcOffset;

// ---------------------------------------------------------------------------
// Capability surface
// ---------------------------------------------------------------------------

/// Platform strategy for committing timezone and clock changes.
pub trait Applier {
    /// Apply the device's timezone from an IANA id and/or raw UTC offset.
    /// Returns whether the host timezone was changed.
    fn apply_timezone(&self, zone: Option<&str>, offset: Option<&UtcOffset>) -> bool;

    /// Force the host clock to the given epoch seconds (interpreted as UTC).
    /// Returns whether the set command succeeded.
    fn apply_epoch(&self, epoch_seconds: i64) -> bool;
}

/// Privilege elevation capability.
///
/// `ensure_elevated` returns only when the process has sufficient rights.
/// Implementations may replace the process with an elevated re-exec (never
/// returning) or exit after spawning an elevated copy; control never comes
/// back to the caller with insufficient privileges.
pub trait Elevate {
    fn ensure_elevated(&self) -> Result<(), ApplyError>;
}

// ---------------------------------------------------------------------------
// Host selection
// ---------------------------------------------------------------------------

#[cfg(not(windows))]
pub fn host_applier() -> Box<dyn Applier> {
    Box::new(posix::PosixApplier)
}

#[cfg(windows)]
pub fn host_applier() -> Box<dyn Applier> {
    Box::new(windows::WindowsApplier)
}

#[cfg(unix)]
pub fn host_elevator() -> Box<dyn Elevate> {
    Box::new(posix::PosixElevator)
}

#[cfg(windows)]
pub fn host_elevator() -> Box<dyn Elevate> {
    Box::new(windows::WindowsElevator)
}
