//! Error types for tetherclock-daemon.

use thiserror::Error;

use tetherclock_bridge::BridgeError;

/// All errors that can escape the daemon loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// A bridge failure. Only `ToolMissing` is fatal to the loop; everything
    /// else is caught at the iteration boundary.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The async runtime could not be built.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The log file could not be opened.
    #[error("failed to open log file: {0}")]
    Logging(#[source] std::io::Error),
}
