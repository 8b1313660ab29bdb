//! Error types for tetherclock-apply.

use thiserror::Error;

/// Errors from privilege elevation. Appliers themselves report plain
/// booleans; only elevation can fail the whole attempt.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Underlying I/O failure while preparing the elevated re-exec.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The elevation hand-off itself failed after it was attempted.
    #[error("privilege elevation failed: {0}")]
    Elevation(String),

    /// No elevation mechanism is available on this host.
    #[error("need administrative rights but no elevation mechanism is available")]
    ElevationUnavailable,
}
